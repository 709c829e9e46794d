use crate::config::AverageConfig;
use crate::error::{DspError, Result};
use crate::signal_processing::{Filter, SampleHistory};

/// Ring-buffer moving average
///
/// Keeps the last `capacity` samples and returns the mean of the most recent
/// `window` of them, including the sample just written. Until `window`
/// samples have been written the never-written slots count as zero, so the
/// output ramps up from zero like the board firmware does.
pub struct MovingAverage {
    history: SampleHistory<f32>,
    window: usize,
}

impl MovingAverage {
    /// Create a new moving average filter
    ///
    /// # Errors
    /// Returns `DspError::InvalidWindow` unless `1 <= window <= capacity`
    pub fn new(config: &AverageConfig) -> Result<Self> {
        check_window(config.window, config.capacity)?;
        Ok(Self {
            history: SampleHistory::new(config.capacity),
            window: config.window,
        })
    }

    /// Add `value` and return the mean of the last `window` samples
    ///
    /// The window may differ from call to call; it is checked against the
    /// history capacity every time.
    pub fn process_window(&mut self, value: f32, window: usize) -> Result<f32> {
        check_window(window, self.history.capacity())?;
        self.history.push(value);
        Ok(self.mean_of_latest(window))
    }

    /// Add `value` and return the mean over the configured window
    pub fn add(&mut self, value: f32) -> f32 {
        self.history.push(value);
        self.mean_of_latest(self.window)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn mean_of_latest(&self, window: usize) -> f32 {
        let sum: f32 = self.history.iter_latest(window).sum();
        sum / window as f32
    }
}

fn check_window(window: usize, capacity: usize) -> Result<()> {
    if window == 0 || window > capacity {
        return Err(DspError::InvalidWindow { window, capacity });
    }
    Ok(())
}

impl Filter for MovingAverage {
    fn process(&mut self, sample: f32) -> f32 {
        self.add(sample)
    }
}
