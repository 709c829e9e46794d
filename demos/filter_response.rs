use dsmv_dsp::config::{
    AverageConfig, ConversionConfig, FirConfig, FirType, IirOrder, LowOrderIirConfig, Window,
};
use dsmv_dsp::constants::{LOCK_IN_DAMPING, MAX_IIR_HISTORY};
use dsmv_dsp::signal_processing::{
    Filter, FirFilter, IirCoefficients, IirFilter, IirHighpass, IirLowpass, MovingAverage,
};
use dsmv_dsp::simulation::{gain_db, measure_gain};

const SAMPLE_RATE: f32 = 80_000.0;
const FREQS: [f32; 10] = [
    50.0, 200.0, 500.0, 1000.0, 2000.0, 3000.0, 5000.0, 10_000.0, 20_000.0, 35_000.0,
];

fn main() -> anyhow::Result<()> {
    println!("=== Filter Frequency Response Test ===\n");

    println!("Moving average (8 samples):");
    let mut average = MovingAverage::new(&AverageConfig {
        window: 8,
        ..AverageConfig::default()
    })?;
    print_response(&mut average);

    for order in [IirOrder::First, IirOrder::Second, IirOrder::Third] {
        println!("\nLow-pass {:?} order (1000 Hz):", order);
        let mut lowpass = IirLowpass::new(
            &LowOrderIirConfig {
                order,
                cutoff_hz: 1000.0,
            },
            SAMPLE_RATE,
        )?;
        print_response(&mut lowpass);
    }

    println!("\nHigh-pass Second order (2000 Hz):");
    let mut highpass = IirHighpass::new(
        &LowOrderIirConfig {
            order: IirOrder::Second,
            cutoff_hz: 2000.0,
        },
        SAMPLE_RATE,
    )?;
    print_response(&mut highpass);

    println!("\nBilinear IIR low-pass (1000 Hz, lock-in damping):");
    let coefficients = IirCoefficients::bilinear_lowpass(1000.0, SAMPLE_RATE, LOCK_IN_DAMPING)?;
    let mut iir = IirFilter::new(coefficients, MAX_IIR_HISTORY)?;
    print_response(&mut iir);

    for (filter_type, cutoff_high_hz) in [
        (FirType::LowPass, None),
        (FirType::HighPass, None),
        (FirType::BandPass, Some(5000.0)),
        (FirType::BandStop, Some(5000.0)),
    ] {
        let config = FirConfig {
            filter_type,
            cutoff_hz: 2000.0,
            cutoff_high_hz,
            order: 141,
            window: Window::Hamming,
            ..FirConfig::default()
        };
        println!("\nFIR {:?} (2000 Hz, 141 taps, Hamming):", filter_type);
        let mut fir = FirFilter::new(&config, SAMPLE_RATE, ConversionConfig::default())?;
        print_response(&mut fir);
    }

    println!("\nFilter test complete.");
    Ok(())
}

fn print_response<F: Filter>(filter: &mut F) {
    println!("{:<10} {:<10}", "Freq (Hz)", "Gain (dB)");
    println!("{}", "-".repeat(21));

    for freq in FREQS {
        let gain = measure_gain(filter, freq, SAMPLE_RATE, 16_000, 16_000);
        println!("{:<10.1} {:<10.2}", freq, gain_db(1.0, gain.max(1e-9)));
    }
}
