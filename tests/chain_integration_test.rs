use dsmv_dsp::acquisition::{Acquisition, SampleSource, TextSource, WavFileSource};
use dsmv_dsp::config::{
    ChainConfig, ConversionConfig, FilterProps, FirType, StageConfig,
};
use dsmv_dsp::simulation::{
    NoiseConfig, apply_noise, generate_sine, generate_tones, quantize, tone_amplitude,
};
use dsmv_dsp::{Sample, SignalChain, save_wav_raw};

const BAND_PASS_CHAIN: &str = r#"
sample_rate_hz = 80000.0

[[stage]]
kind = "moving_average"
window = 2

[[stage]]
kind = "fir"
filter_type = "band_pass"
cutoff_hz = 2000.0
cutoff_high_hz = 6000.0
order = 141
window = "hamming"

[[stage]]
kind = "scale"
factor = 2.0
"#;

#[test]
fn test_band_pass_chain_from_toml() {
    let config = ChainConfig::from_toml_str(BAND_PASS_CHAIN).unwrap();
    let mut chain = SignalChain::new(&config).unwrap();
    let fs = config.sample_rate_hz;

    let input = generate_tones(8400, fs, &[(200.0, 1.0), (4000.0, 1.0), (20_000.0, 0.5)]);
    let output: Vec<f32> = chain
        .process_buffer(&quantize(&input, &config.conversion))
        .iter()
        .map(|o| o.output)
        .collect();
    let settled = &output[400..];

    // window-2 average gain at 4 kHz is cos(pi * 4000 / 80000)
    let expected = 2.0 * (std::f32::consts::PI * 4000.0 / fs).cos();
    let passed = tone_amplitude(settled, 4000.0, fs);
    assert!(
        (passed - expected).abs() < 0.05,
        "4 kHz amplitude {}, expected {}",
        passed,
        expected
    );
    assert!(tone_amplitude(settled, 200.0, fs) < 0.05);
    assert!(tone_amplitude(settled, 20_000.0, fs) < 0.05);
    assert_eq!(chain.samples_processed(), 8400);
}

#[test]
fn test_lock_in_recovers_tone_in_noise() {
    let config = ChainConfig::from_toml_str(
        r#"
        sample_rate_hz = 20000.0

        [[stage]]
        kind = "scale"
        factor = 2.0

        [lock_in]
        reference_hz = 500.0
        "#,
    )
    .unwrap();
    let mut chain = SignalChain::new(&config).unwrap();
    let fs = config.sample_rate_hz;

    for (amplitude, phase_deg) in [(0.5f32, 30.0f32), (0.25, -120.0)] {
        let mut tone = generate_sine(12_000, fs, 500.0, amplitude, phase_deg);
        for (s, interferer) in tone.iter_mut().zip(generate_sine(12_000, fs, 3100.0, 0.5, 0.0)) {
            *s += interferer;
        }
        let noisy = apply_noise(&tone, &NoiseConfig::default().with_seed(7).with_awgn(30.0), fs);

        let outputs = chain.process_buffer(&quantize(&noisy, &config.conversion));
        let last = outputs
            .last()
            .and_then(|o| o.lock_in)
            .expect("lock-in output");

        assert!(
            (last.magnitude() - 2.0 * amplitude).abs() < 0.05,
            "R = {}, expected {}",
            last.magnitude(),
            2.0 * amplitude
        );
        let mut phase_err = (last.phase_deg() - phase_deg).abs();
        if phase_err > 180.0 {
            phase_err = 360.0 - phase_err;
        }
        assert!(phase_err < 5.0, "phase {} expected {}", last.phase_deg(), phase_deg);
    }
}

#[test]
fn test_integer_fir_chain_from_props() {
    let conversion = ConversionConfig {
        volts_per_lsb: 1.0 / 1024.0,
        ..ConversionConfig::default()
    };
    let props = FilterProps::from_slice(&[0.0, 0.0, 5.0, 0.0, 0.0, 80_000.0]).unwrap();
    let config = ChainConfig {
        sample_rate_hz: props.sample_rate_hz(),
        conversion,
        stages: vec![StageConfig::Fir(props.fir_config(FirType::MovingAverage).unwrap())],
        ..ChainConfig::default()
    };
    let mut chain = SignalChain::new(&config).unwrap();

    let outputs: Vec<f32> = (0..10)
        .map(|_| chain.process(Sample::from_raw(1024, &conversion)).output)
        .collect();

    // (1024 >> 2) * (512 / 5) * 5 >> 7 = 1020 LSB
    for &y in &outputs[4..] {
        assert_eq!(y, 1020.0 / 1024.0);
    }
    assert!(outputs[..4].iter().all(|&y| y < 1020.0 / 1024.0));
}

#[test]
fn test_wav_recording_through_acquisition() {
    let path = std::env::temp_dir().join(format!("dsmv_chain_{}.wav", std::process::id()));
    let readings: Vec<i16> = (0..1000).map(|i| ((i % 50) * 40 - 1000) as i16).collect();
    save_wav_raw(&path, &readings, 8000).unwrap();

    let conversion = ConversionConfig {
        volts_per_lsb: 0.001,
        ..ConversionConfig::default()
    };
    let source = WavFileSource::new(&path, 64, &conversion).unwrap();
    assert_eq!(source.sample_rate(), Some(8000));

    let acquisition = Acquisition::start(Box::new(source), 64, 8000).unwrap();
    let samples: Vec<Sample> = acquisition.receiver().iter().flatten().collect();
    assert_eq!(acquisition.join().unwrap(), 1000);
    std::fs::remove_file(&path).ok();

    let raw: Vec<i16> = samples.iter().map(|s| s.raw as i16).collect();
    assert_eq!(raw, readings);
    assert!((samples[0].volts - (-1.0)).abs() < 1e-6);
}

#[test]
fn test_text_recording_through_chain() {
    let text = "# volts raw\n0.5 500\n1.0\n\n-0.25 -250\n";
    let conversion = ConversionConfig {
        volts_per_lsb: 0.001,
        ..ConversionConfig::default()
    };
    let source = TextSource::new(text.as_bytes(), 2, conversion);
    let acquisition = Acquisition::start(Box::new(source), 2, 80_000).unwrap();

    let config = ChainConfig {
        conversion,
        ..ChainConfig::default()
    };
    let mut chain = SignalChain::new(&config).unwrap();
    let outputs: Vec<f32> = acquisition
        .receiver()
        .iter()
        .flatten()
        .map(|s| chain.process(s).output)
        .collect();
    assert_eq!(acquisition.join().unwrap(), 3);
    assert_eq!(outputs, vec![0.5, 1.0, -0.25]);
}
