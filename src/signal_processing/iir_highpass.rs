use std::f32::consts::PI;

use crate::config::{IirOrder, LowOrderIirConfig};
use crate::error::Result;
use crate::signal_processing::Filter;
use crate::signal_processing::iir_lowpass::{discretization_factor, validate_cutoff};

/// First, second or third order high-pass
///
/// Backward-difference discretisation of `((s/w_c) / (1 + s/w_c))^N`. The
/// first-order section is
///
/// ```text
/// y_n = (x_n + y_{n-1} - x_{n-1}) / (2 pi f_c / f_s + 1)
/// ```
///
/// and the higher orders are the same section cascaded in closed form, so
/// they need the last N inputs as well as the last N outputs.
pub struct IirHighpass {
    order: IirOrder,
    cutoff_hz: f32,
    sample_rate_hz: f32,
    inputs: [f32; 3],
    outputs: [f32; 3],
}

impl IirHighpass {
    /// # Errors
    /// Returns `DspError::InvalidCutoff` if the cutoff is not in `(0, f_s/2)`
    pub fn new(config: &LowOrderIirConfig, sample_rate_hz: f32) -> Result<Self> {
        validate_cutoff(config.cutoff_hz, sample_rate_hz)?;
        Ok(Self {
            order: config.order,
            cutoff_hz: config.cutoff_hz,
            sample_rate_hz,
            inputs: [0.0; 3],
            outputs: [0.0; 3],
        })
    }

    /// Filter one sample, recomputing the factors from the given parameters
    pub fn step(&mut self, xn: f32, cutoff_hz: f32, sample_rate_hz: f32) -> f32 {
        let [x1, x2, x3] = self.inputs;
        let [y1, y2, y3] = self.outputs;
        let out = match self.order {
            IirOrder::First => {
                let fac = (2.0 * PI * cutoff_hz) / sample_rate_hz;
                1.0 / (fac + 1.0) * (xn + y1 - x1)
            }
            IirOrder::Second => {
                let f = discretization_factor(cutoff_hz, sample_rate_hz);
                let g = 1.0 + f;
                let f2 = f * f;
                (f2 * (xn - 2.0 * x1 + x2) + 2.0 * f * g * y1 - f2 * y2) / (g * g)
            }
            IirOrder::Third => {
                let f = discretization_factor(cutoff_hz, sample_rate_hz);
                let g = 1.0 + f;
                let f2 = f * f;
                let f3 = f2 * f;
                (f3 * (xn - 3.0 * x1 + 3.0 * x2 - x3) + 3.0 * f * g * g * y1
                    - 3.0 * f2 * g * y2
                    + f3 * y3)
                    / (g * g * g)
            }
        };
        self.inputs = [xn, x1, x2];
        self.outputs = [out, y1, y2];
        out
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) -> Result<()> {
        validate_cutoff(cutoff_hz, self.sample_rate_hz)?;
        self.cutoff_hz = cutoff_hz;
        Ok(())
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn reset(&mut self) {
        self.inputs = [0.0; 3];
        self.outputs = [0.0; 3];
    }
}

impl Filter for IirHighpass {
    fn process(&mut self, sample: f32) -> f32 {
        self.step(sample, self.cutoff_hz, self.sample_rate_hz)
    }
}
