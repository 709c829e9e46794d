use anyhow::{Context, Result};
use clap::Parser;
use dsmv_dsp::config::ConversionConfig;
use dsmv_dsp::simulation::{
    AdditiveNoiseConfig, ImpulseNoiseConfig, NoiseConfig, apply_noise, generate_step,
    generate_tones,
};
use dsmv_dsp::{save_wav, save_wav_raw};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_wav")]
#[command(about = "Generate synthetic test recordings for the DSMV filter chain")]
struct Args {
    /// TOML noise configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "data/synthetic/tones.wav")]
    output: PathBuf,

    /// Tones: comma-separated "freq:amplitude" pairs (e.g. "500:1.0,5000:0.2")
    #[arg(short, long, default_value = "500:1.0")]
    tones: String,

    /// Add a step of this amplitude halfway through
    #[arg(long)]
    step: Option<f32>,

    /// Seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Signal duration in seconds
    #[arg(short, long, default_value_t = 1.0)]
    duration: f32,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 80_000)]
    sample_rate: u32,

    /// Write 16-bit raw readings quantised with this many volts per LSB
    /// instead of float volts
    #[arg(long)]
    volts_per_lsb: Option<f32>,

    /// AWGN SNR in dB (CLI override)
    #[arg(long)]
    snr: Option<f32>,

    /// Impulse noise rate in Hz (CLI override)
    #[arg(long)]
    impulse_rate: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    awgn: Option<AwgnSection>,
    impulse: Option<ImpulseSection>,
    dc_offset: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AwgnSection {
    snr_db: f32,
}

#[derive(Debug, Deserialize)]
struct ImpulseSection {
    rate_hz: f32,
    amplitude: f32,
}

fn parse_tones(s: &str) -> Result<Vec<(f32, f32)>> {
    s.split(',')
        .map(|pair| {
            let (freq, amplitude) = pair
                .trim()
                .split_once(':')
                .with_context(|| format!("Invalid tone '{}', use 'freq:amplitude'", pair))?;
            Ok((
                freq.trim().parse().context("Invalid tone frequency")?,
                amplitude.trim().parse().context("Invalid tone amplitude")?,
            ))
        })
        .collect()
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_noise_config(toml: &TomlConfig, args: &Args) -> NoiseConfig {
    let mut config = NoiseConfig {
        seed: args.seed,
        dc_offset: toml.dc_offset,
        ..NoiseConfig::default()
    };

    if let Some(snr) = args.snr {
        config.additive = Some(AdditiveNoiseConfig { snr_db: snr });
    } else if let Some(ref awgn) = toml.awgn {
        config.additive = Some(AdditiveNoiseConfig {
            snr_db: awgn.snr_db,
        });
    }

    if let Some(impulse_rate) = args.impulse_rate {
        config.impulse = Some(ImpulseNoiseConfig {
            rate_hz: impulse_rate,
            amplitude: 2.0,
        });
    } else if let Some(ref impulse) = toml.impulse {
        config.impulse = Some(ImpulseNoiseConfig {
            rate_hz: impulse.rate_hz,
            amplitude: impulse.amplitude,
        });
    }

    config
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).context("Failed to create output directory")?;
    }

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let tones = parse_tones(&args.tones)?;
    let num_samples = (args.duration * args.sample_rate as f32) as usize;
    let sample_rate = args.sample_rate as f32;

    let mut signal = generate_tones(num_samples, sample_rate, &tones);
    if let Some(amplitude) = args.step {
        for (s, step) in signal
            .iter_mut()
            .zip(generate_step(num_samples, num_samples / 2, amplitude))
        {
            *s += step;
        }
    }
    let signal = apply_noise(&signal, &build_noise_config(&toml_config, &args), sample_rate);

    match args.volts_per_lsb {
        Some(volts_per_lsb) => {
            let conversion = ConversionConfig {
                volts_per_lsb,
                ..ConversionConfig::default()
            };
            conversion.validate()?;
            let readings: Vec<i16> = signal
                .iter()
                .map(|&v| conversion.to_raw(v).clamp(i16::MIN as i32, i16::MAX as i32) as i16)
                .collect();
            save_wav_raw(&args.output, &readings, args.sample_rate)
                .context("Failed to write WAV file")?;
        }
        None => {
            save_wav(&args.output, &signal, args.sample_rate).context("Failed to write WAV file")?;
        }
    }

    eprintln!(
        "Generated {} samples ({} tones) in {}",
        num_samples,
        tones.len(),
        args.output.display()
    );
    Ok(())
}
