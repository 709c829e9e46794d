use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use dsmv_dsp::acquisition::{
    Acquisition, DeadlineMonitor, DeadlineSummary, SampleSource, TextSource, WavFileSource,
};
use dsmv_dsp::output::{OutputFormat, create_formatter, iso8601_timestamp};
use dsmv_dsp::{ChainConfig, SignalChain, save_wav};

#[derive(Parser, Debug)]
#[command(name = "dsmv_dsp")]
#[command(about = "Run a DSMV filter chain over a recorded signal", long_about = None)]
struct Args {
    /// Recording to process: mono WAV, or text with one reading per line
    input: PathBuf,

    /// Chain configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print every Nth output sample
    #[arg(short = 'd', long, default_value_t = 1)]
    decimate: u64,

    /// Samples per chunk handed from the reader thread
    #[arg(long, default_value_t = 256)]
    chunk_size: usize,

    /// Abort on the first sample that overruns its period
    #[arg(long)]
    strict: bool,

    /// Also write the chain output to a mono WAV file
    #[arg(long)]
    output_wav: Option<PathBuf>,

    /// Print a JSON run summary to stderr when done
    #[arg(long)]
    summary: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    input: String,
    started: String,
    finished: String,
    sample_rate_hz: f32,
    stages: Vec<&'static str>,
    samples: u64,
    timing: DeadlineSummary,
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

    let mut config = match &args.config {
        Some(path) => ChainConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ChainConfig::default(),
    };
    if args.strict {
        config.deadline.strict = true;
    }

    let source = open_source(&args.input, args.chunk_size, &config)?;
    let sample_rate = config.sample_rate_hz.round() as u32;
    if let Some(recorded) = source.sample_rate()
        && recorded != sample_rate
    {
        log::warn!(
            "{} was recorded at {} Hz but the chain is designed for {} Hz",
            args.input.display(),
            recorded,
            sample_rate
        );
    }

    let mut chain = SignalChain::new(&config).context("Failed to build signal chain")?;
    let mut monitor = DeadlineMonitor::new(config.sample_rate_hz, &config.deadline);
    let formatter = create_formatter(args.format, args.verbose > 0);
    let started = iso8601_timestamp();

    let acquisition = Acquisition::start(source, args.chunk_size as u32, sample_rate)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Some(header) = formatter.header() {
        writeln!(out, "{}", header)?;
    }

    let decimate = args.decimate.max(1);
    let mut recorded = Vec::new();
    for chunk in acquisition.receiver().iter() {
        for sample in chunk {
            let output = monitor.time(|| chain.process(sample))?;
            if output.index % decimate == 0 {
                writeln!(out, "{}", formatter.format(&output))?;
            }
            if args.output_wav.is_some() {
                recorded.push(output.output);
            }
        }
    }
    out.flush()?;
    drop(out);

    let sent = acquisition.join().context("Reading input failed")?;
    log::info!(
        "Processed {} of {} samples, {} deadline misses",
        chain.samples_processed(),
        sent,
        monitor.missed()
    );

    if let Some(path) = &args.output_wav {
        save_wav(path, &recorded, sample_rate)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {} samples to {}", recorded.len(), path.display());
    }

    if args.summary {
        let summary = RunSummary {
            input: args.input.display().to_string(),
            started,
            finished: iso8601_timestamp(),
            sample_rate_hz: chain.sample_rate_hz(),
            stages: chain.stages().iter().map(|s| s.name()).collect(),
            samples: chain.samples_processed(),
            timing: monitor.summary(),
        };
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

fn open_source(
    path: &Path,
    chunk_size: usize,
    config: &ChainConfig,
) -> anyhow::Result<Box<dyn SampleSource>> {
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    let source: Box<dyn SampleSource> = if is_wav {
        Box::new(WavFileSource::new(path, chunk_size, &config.conversion)?)
    } else {
        Box::new(TextSource::open(path, chunk_size, config.conversion)?)
    };
    Ok(source)
}
