use std::time::{Duration, Instant};

use rolling_stats::Stats;
use serde::Serialize;

use crate::config::DeadlineConfig;
use crate::error::{DspError, Result};

/// Checks per-sample processing time against the sample period
///
/// On the board a sample that is not processed before the next timer tick is
/// lost. Strict mode turns the first overrun into
/// [`DspError::DeadlineMissed`]; otherwise overruns are counted and logged.
pub struct DeadlineMonitor {
    period: Duration,
    strict: bool,
    /// Processing time in microseconds
    stats: Stats<f32>,
    missed: u64,
}

/// Timing statistics of a run
#[derive(Debug, Clone, Serialize)]
pub struct DeadlineSummary {
    pub period_us: f32,
    pub count: usize,
    pub mean_us: f32,
    pub std_dev_us: f32,
    pub min_us: f32,
    pub max_us: f32,
    pub missed: u64,
}

impl DeadlineMonitor {
    pub fn new(sample_rate_hz: f32, config: &DeadlineConfig) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / sample_rate_hz as f64),
            strict: config.strict,
            stats: Stats::new(),
            missed: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Record the processing time of one sample
    pub fn record(&mut self, elapsed: Duration) -> Result<()> {
        let elapsed_us = elapsed.as_secs_f32() * 1e6;
        self.stats.update(elapsed_us);
        if elapsed <= self.period {
            return Ok(());
        }

        self.missed += 1;
        let period_us = self.period.as_secs_f32() * 1e6;
        if self.strict {
            return Err(DspError::DeadlineMissed {
                elapsed_us,
                period_us,
            });
        }
        if self.missed.is_power_of_two() {
            log::warn!(
                "Deadline missed {} times (last {:.1}us, period {:.1}us)",
                self.missed,
                elapsed_us,
                period_us
            );
        }
        Ok(())
    }

    /// Run `f` and record how long it took
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> Result<T> {
        let start = Instant::now();
        let value = f();
        self.record(start.elapsed())?;
        Ok(value)
    }

    pub fn missed(&self) -> u64 {
        self.missed
    }

    pub fn summary(&self) -> DeadlineSummary {
        DeadlineSummary {
            period_us: self.period.as_secs_f32() * 1e6,
            count: self.stats.count,
            mean_us: self.stats.mean,
            std_dev_us: self.stats.std_dev,
            min_us: self.stats.min,
            max_us: self.stats.max,
            missed: self.missed,
        }
    }
}
