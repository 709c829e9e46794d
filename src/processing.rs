use serde::Serialize;

use crate::config::{ChainConfig, ConversionConfig, StageConfig};
use crate::error::Result;
use crate::signal_processing::{
    Filter, FirFilter, IirFilter, IirHighpass, IirLowpass, LockInAmplifier, LockInOutput,
    MovingAverage, Scale,
};

/// One converter reading in both forms
///
/// `volts` and `raw` describe the same physical instant. Float stages use
/// `volts`; the integer FIR path uses `raw`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub volts: f32,
    pub raw: i32,
}

impl Sample {
    pub fn from_raw(raw: i32, conversion: &ConversionConfig) -> Self {
        Self {
            volts: conversion.to_volts(raw as f32),
            raw,
        }
    }

    pub fn from_volts(volts: f32, conversion: &ConversionConfig) -> Self {
        Self {
            volts,
            raw: conversion.to_raw(volts),
        }
    }
}

/// A built chain stage
pub enum Stage {
    Scale(Scale),
    MovingAverage(MovingAverage),
    LowPass(IirLowpass),
    HighPass(IirHighpass),
    Iir(IirFilter),
    Fir(FirFilter),
}

impl Stage {
    pub fn from_config(
        config: &StageConfig,
        sample_rate_hz: f32,
        conversion: ConversionConfig,
    ) -> Result<Self> {
        Ok(match config {
            StageConfig::Scale(c) => Stage::Scale(Scale::new(c)?),
            StageConfig::MovingAverage(c) => Stage::MovingAverage(MovingAverage::new(c)?),
            StageConfig::LowPass(c) => Stage::LowPass(IirLowpass::new(c, sample_rate_hz)?),
            StageConfig::HighPass(c) => Stage::HighPass(IirHighpass::new(c, sample_rate_hz)?),
            StageConfig::Iir(c) => Stage::Iir(IirFilter::from_config(c, sample_rate_hz)?),
            StageConfig::Fir(c) => Stage::Fir(FirFilter::new(c, sample_rate_hz, conversion)?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Scale(_) => "scale",
            Stage::MovingAverage(_) => "moving_average",
            Stage::LowPass(_) => "low_pass",
            Stage::HighPass(_) => "high_pass",
            Stage::Iir(_) => "iir",
            Stage::Fir(_) => "fir",
        }
    }

    #[inline]
    pub fn process(&mut self, sample: Sample) -> f32 {
        match self {
            Stage::Scale(s) => s.process(sample.volts),
            Stage::MovingAverage(s) => s.process(sample.volts),
            Stage::LowPass(s) => s.process(sample.volts),
            Stage::HighPass(s) => s.process(sample.volts),
            Stage::Iir(s) => s.process(sample.volts),
            Stage::Fir(s) => s.process_sample(sample.volts, sample.raw),
        }
    }
}

/// Result of pushing one sample through the chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChainOutput {
    /// Zero-based index of the sample in the run
    pub index: u64,
    pub input: f32,
    pub output: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_in: Option<LockInOutput>,
}

/// Ordered filter stages with an optional lock-in on the end
///
/// Each stage receives the previous stage's output. Downstream stages get a
/// raw reading re-quantised from that output through the conversion, so an
/// integer FIR keeps working after float stages.
pub struct SignalChain {
    stages: Vec<Stage>,
    lock_in: Option<LockInAmplifier>,
    conversion: ConversionConfig,
    sample_rate_hz: f32,
    samples_processed: u64,
}

impl SignalChain {
    pub fn new(config: &ChainConfig) -> Result<Self> {
        config.validate()?;
        let stages = config
            .stages
            .iter()
            .map(|stage| Stage::from_config(stage, config.sample_rate_hz, config.conversion))
            .collect::<Result<Vec<_>>>()?;
        let lock_in = config
            .lock_in
            .as_ref()
            .map(|c| LockInAmplifier::new(c, config.sample_rate_hz, config.conversion))
            .transpose()?;

        log::debug!(
            "Signal chain at {} Hz: [{}]{}",
            config.sample_rate_hz,
            stages.iter().map(Stage::name).collect::<Vec<_>>().join(" -> "),
            if lock_in.is_some() { " -> lock_in" } else { "" }
        );

        Ok(Self {
            stages,
            lock_in,
            conversion: config.conversion,
            sample_rate_hz: config.sample_rate_hz,
            samples_processed: 0,
        })
    }

    pub fn process(&mut self, sample: Sample) -> ChainOutput {
        let mut current = sample;
        let mut output = sample.volts;
        for stage in &mut self.stages {
            output = stage.process(current);
            current = Sample::from_volts(output, &self.conversion);
        }
        let lock_in = self.lock_in.as_mut().map(|l| l.process(output));

        let index = self.samples_processed;
        self.samples_processed += 1;
        ChainOutput {
            index,
            input: sample.volts,
            output,
            lock_in,
        }
    }

    pub fn process_buffer(&mut self, samples: &[Sample]) -> Vec<ChainOutput> {
        samples.iter().map(|&s| self.process(s)).collect()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate_hz
    }

    pub fn conversion(&self) -> &ConversionConfig {
        &self.conversion
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AverageConfig, ScaleConfig};

    #[test]
    fn test_empty_chain_passes_through() {
        let mut chain = SignalChain::new(&ChainConfig::default()).unwrap();
        let out = chain.process(Sample {
            volts: 1.25,
            raw: 5,
        });
        assert_eq!(out.output, 1.25);
        assert_eq!(out.index, 0);
        assert!(out.lock_in.is_none());
        assert_eq!(chain.process(Sample::default()).index, 1);
    }

    #[test]
    fn test_stages_run_in_order() {
        let config = ChainConfig {
            stages: vec![
                StageConfig::MovingAverage(AverageConfig {
                    window: 2,
                    ..AverageConfig::default()
                }),
                StageConfig::Scale(ScaleConfig { factor: 4.0 }),
            ],
            ..ChainConfig::default()
        };
        let mut chain = SignalChain::new(&config).unwrap();
        let outputs: Vec<f32> = chain
            .process_buffer(&[
                Sample::from_volts(1.0, &config.conversion),
                Sample::from_volts(3.0, &config.conversion),
            ])
            .iter()
            .map(|o| o.output)
            .collect();
        assert_eq!(outputs, vec![2.0, 8.0]);
        assert_eq!(chain.stages().len(), 2);
        assert_eq!(chain.stages()[1].name(), "scale");
    }

    #[test]
    fn test_invalid_stage_rejected() {
        let config = ChainConfig {
            stages: vec![StageConfig::MovingAverage(AverageConfig {
                window: 0,
                ..AverageConfig::default()
            })],
            ..ChainConfig::default()
        };
        assert!(SignalChain::new(&config).is_err());
    }

    #[test]
    fn test_sample_conversion() {
        let conversion = ConversionConfig {
            volts_per_lsb: 1.0 / 1024.0,
            gain: 1.0,
            offset: 0.0,
        };
        let sample = Sample::from_raw(1536, &conversion);
        assert_eq!(sample.volts, 1.5);
        assert_eq!(Sample::from_volts(0.25, &conversion).raw, 256);
    }
}
