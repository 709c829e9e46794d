use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use dsmv_dsp::config::{FirConfig, FirType, Window};
use dsmv_dsp::constants::{COEFF_PREC, MAX_FIR_ORDER};
use dsmv_dsp::signal_processing::{FirCoefficients, IirCoefficients};

#[derive(Parser, Debug)]
#[command(name = "design_fir")]
#[command(about = "Print FIR taps in float and fixed point, or convert an IIR CSV export", long_about = None)]
struct Args {
    /// Filter design
    #[arg(value_enum, default_value = "low-pass")]
    filter_type: FirType,

    /// Cutoff (lower band edge) in Hz
    #[arg(long, default_value_t = 1000.0)]
    cutoff: f32,

    /// Upper band edge in Hz for band-pass and band-stop
    #[arg(long)]
    cutoff_high: Option<f32>,

    /// Number of taps
    #[arg(short = 'n', long, default_value_t = 31)]
    order: usize,

    #[arg(short, long, value_enum, default_value = "rectangular")]
    window: Window,

    /// Processing frequency in Hz
    #[arg(short = 's', long, default_value_t = 80_000.0)]
    sample_rate: f32,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: Format,

    /// Also print the magnitude response at this many frequencies up to Nyquist
    #[arg(long)]
    response: Option<usize>,

    /// Convert a two-row PyFDA CSV (b, a) instead of designing a FIR
    #[arg(long)]
    iir_csv: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Format {
    Text,
    /// C array initialisers for the firmware
    C,
    Json,
}

#[derive(Debug, Serialize)]
struct FirDesign<'a> {
    config: &'a FirConfig,
    sample_rate_hz: f32,
    coeff_prec: u32,
    taps: &'a [f32],
    fixed: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    response: Vec<(f32, f32)>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Some(path) = &args.iir_csv {
        let coefficients = IirCoefficients::from_csv_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        print_iir(&coefficients, args.format)?;
        return Ok(());
    }

    let config = FirConfig {
        filter_type: args.filter_type,
        cutoff_hz: args.cutoff,
        cutoff_high_hz: args.cutoff_high,
        order: args.order,
        window: args.window,
        max_order: MAX_FIR_ORDER,
        ..FirConfig::default()
    };
    let coefficients = FirCoefficients::design(&config, args.sample_rate)?;
    let response = args
        .response
        .map(|points| response_points(&coefficients, args.sample_rate, points))
        .unwrap_or_default();

    match args.format {
        Format::Text => {
            println!(
                "{:?} {} taps, fs = {} Hz, window {:?}",
                config.filter_type,
                coefficients.len(),
                args.sample_rate,
                config.window
            );
            println!("{:>5} {:>14} {:>8}", "i", "float", "fixed");
            for (i, (h, q)) in coefficients
                .taps()
                .iter()
                .zip(coefficients.fixed_taps())
                .enumerate()
            {
                println!("{:>5} {:>14.9} {:>8}", i, h, q.to_bits());
            }
            if !response.is_empty() {
                println!("\n{:>10} {:>10}", "Freq (Hz)", "Gain (dB)");
                for (freq, gain) in &response {
                    println!("{:>10.1} {:>10.2}", freq, 20.0 * gain.max(1e-9).log10());
                }
            }
        }
        Format::C => {
            println!("float h[{}] = {{{}}};", coefficients.len(), join(coefficients.taps()));
            let fixed: Vec<i64> = coefficients.fixed_taps().iter().map(|q| q.to_bits()).collect();
            println!("int hInt[{}] = {{{}}};", coefficients.len(), join(&fixed));
        }
        Format::Json => {
            let design = FirDesign {
                config: &config,
                sample_rate_hz: args.sample_rate,
                coeff_prec: COEFF_PREC,
                taps: coefficients.taps(),
                fixed: coefficients.fixed_taps().iter().map(|q| q.to_bits()).collect(),
                response,
            };
            println!("{}", serde_json::to_string_pretty(&design)?);
        }
    }
    Ok(())
}

fn print_iir(coefficients: &IirCoefficients, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Text => {
            println!("b ({} taps): {}", coefficients.b().len(), join(coefficients.b()));
            println!("a ({} taps): {}", coefficients.a().len(), join(coefficients.a()));
        }
        Format::C => {
            println!("float b[{}] = {{{}}};", coefficients.b().len(), join(coefficients.b()));
            println!("float a[{}] = {{{}}};", coefficients.a().len(), join(coefficients.a()));
        }
        Format::Json => {
            let value = serde_json::json!({
                "b": coefficients.b(),
                "a": coefficients.a(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn response_points(coefficients: &FirCoefficients, sample_rate: f32, points: usize) -> Vec<(f32, f32)> {
    let points = points.max(2);
    (0..points)
        .map(|i| {
            let freq = sample_rate / 2.0 * i as f32 / (points - 1) as f32;
            (freq, coefficients.magnitude_at(freq, sample_rate))
        })
        .collect()
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
