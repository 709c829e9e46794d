use std::f32::consts::PI;

use crate::config::{IirOrder, LowOrderIirConfig, validate_sample_rate};
use crate::error::{DspError, Result};
use crate::signal_processing::Filter;

/// Ratio `f_s / (2 pi f_c)` used by the backward-Euler sections
#[inline]
pub(crate) fn discretization_factor(cutoff_hz: f32, sample_rate_hz: f32) -> f32 {
    sample_rate_hz / (2.0 * PI * cutoff_hz)
}

pub(crate) fn validate_cutoff(cutoff_hz: f32, sample_rate_hz: f32) -> Result<()> {
    validate_sample_rate(sample_rate_hz)?;
    if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 {
        return Err(DspError::InvalidCutoff(format!(
            "cutoff must be positive, got {} Hz",
            cutoff_hz
        )));
    }
    if cutoff_hz >= sample_rate_hz / 2.0 {
        return Err(DspError::InvalidCutoff(format!(
            "cutoff {} Hz is not below Nyquist ({} Hz)",
            cutoff_hz,
            sample_rate_hz / 2.0
        )));
    }
    Ok(())
}

/// First, second or third order low-pass
///
/// The analog prototype `1 / (1 + s/w_c)^N` discretised with the backward
/// difference `s = f_s (1 - z^-1)`. With `f = f_s / (2 pi f_c)`:
///
/// ```text
/// N=1: y_n = (x_n + f y_{n-1}) / (1 + f)
/// N=2: y_n = ((2f + 2f^2) y_{n-1} - f^2 y_{n-2} + x_n) / (1 + 2f + f^2)
/// N=3: y_n = ((3f + 6f^2 + 3f^3) y_{n-1} - (3f^2 + 3f^3) y_{n-2} + f^3 y_{n-3} + x_n)
///            / (1 + 3f + 3f^2 + f^3)
/// ```
///
/// All poles are real, so the step response approaches its final value
/// without overshoot.
pub struct IirLowpass {
    order: IirOrder,
    cutoff_hz: f32,
    sample_rate_hz: f32,
    /// y_{n-1}, y_{n-2}, y_{n-3}
    outputs: [f32; 3],
}

impl IirLowpass {
    /// # Errors
    /// Returns `DspError::InvalidCutoff` if the cutoff is not in `(0, f_s/2)`
    pub fn new(config: &LowOrderIirConfig, sample_rate_hz: f32) -> Result<Self> {
        validate_cutoff(config.cutoff_hz, sample_rate_hz)?;
        Ok(Self {
            order: config.order,
            cutoff_hz: config.cutoff_hz,
            sample_rate_hz,
            outputs: [0.0; 3],
        })
    }

    /// Filter one sample with the given cutoff and processing frequency
    ///
    /// The factors are recomputed on every call, so the cutoff may change
    /// between samples without resetting the history.
    pub fn step(&mut self, xn: f32, cutoff_hz: f32, sample_rate_hz: f32) -> f32 {
        let f = discretization_factor(cutoff_hz, sample_rate_hz);
        let [y1, y2, y3] = self.outputs;
        let out = match self.order {
            IirOrder::First => 1.0 / (f + 1.0) * (xn + f * y1),
            IirOrder::Second => {
                let fac = 1.0 + 2.0 * f + f * f;
                let fac2 = 2.0 * f + 2.0 * f * f;
                let fac3 = f * f;
                1.0 / fac * (fac2 * y1 - fac3 * y2 + xn)
            }
            IirOrder::Third => {
                let fac = 1.0 + 3.0 * f + 3.0 * f * f + f * f * f;
                let fac1 = 3.0 * f + 6.0 * f * f + 3.0 * f * f * f;
                let fac2 = 3.0 * f * f + 3.0 * f * f * f;
                let fac3 = f * f * f;
                1.0 / fac * (fac1 * y1 - fac2 * y2 + fac3 * y3 + xn)
            }
        };
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

    pub fn order(&self) -> IirOrder {
        self.order
    }

    pub fn reset(&mut self) {
        self.outputs = [0.0; 3];
    }
}

impl Filter for IirLowpass {
    fn process(&mut self, sample: f32) -> f32 {
        self.step(sample, self.cutoff_hz, self.sample_rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowpass(order: IirOrder, cutoff_hz: f32) -> IirLowpass {
        IirLowpass::new(&LowOrderIirConfig { order, cutoff_hz }, 10_000.0).unwrap()
    }

    fn sine_rms<F: Filter>(filter: &mut F, freq: f32, sample_rate: f32) -> f32 {
        let mut out: Vec<f32> = (0..8000)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect();
        filter.process_buffer(&mut out);
        let tail = &out[4000..];
        (tail.iter().map(|x| x * x).sum::<f32>() / tail.len() as f32).sqrt()
    }

    #[test]
    fn test_first_order_recurrence() {
        let mut filter = lowpass(IirOrder::First, 100.0);
        let f = discretization_factor(100.0, 10_000.0);
        let y0 = filter.process(1.0);
        assert!((y0 - 1.0 / (1.0 + f)).abs() < 1e-7);
        let y1 = filter.process(1.0);
        assert!((y1 - (1.0 + f * y0) / (1.0 + f)).abs() < 1e-6);
    }

    #[test]
    fn test_dc_gain_is_unity() {
        for order in [IirOrder::First, IirOrder::Second, IirOrder::Third] {
            let mut filter = lowpass(order, 500.0);
            let mut y = 0.0;
            for _ in 0..2000 {
                y = filter.process(0.75);
            }
            assert!((y - 0.75).abs() < 1e-4, "{:?}: settled at {}", order, y);
        }
    }

    #[test]
    fn test_second_order_step_monotonic() {
        let mut filter = lowpass(IirOrder::Second, 200.0);
        let amplitude = 2.0;
        let mut previous = 0.0;
        for n in 0..3000 {
            let y = filter.process(amplitude);
            assert!(y >= previous - 1e-6, "step response fell at sample {}", n);
            assert!(y <= amplitude + 1e-5, "overshoot {} at sample {}", y, n);
            previous = y;
        }
        assert!((previous - amplitude).abs() < 1e-3);
    }

    #[test]
    fn test_higher_order_attenuates_more() {
        let mut rms = Vec::new();
        for order in [IirOrder::First, IirOrder::Second, IirOrder::Third] {
            let mut filter = lowpass(order, 100.0);
            rms.push(sine_rms(&mut filter, 2000.0, 10_000.0));
        }
        assert!(rms[0] < 0.1, "first order passed {}", rms[0]);
        assert!(rms[1] < rms[0]);
        assert!(rms[2] < rms[1]);
    }

    #[test]
    fn test_cutoff_change_keeps_history() {
        let mut a = lowpass(IirOrder::Second, 100.0);
        let mut b = lowpass(IirOrder::Second, 100.0);
        for _ in 0..10 {
            a.process(1.0);
            b.step(1.0, 100.0, 10_000.0);
        }
        b.set_cutoff(400.0).unwrap();
        let ya = a.step(1.0, 400.0, 10_000.0);
        let yb = b.process(1.0);
        assert_eq!(ya, yb);
    }

    #[test]
    fn test_invalid_cutoff() {
        let config = |cutoff_hz| LowOrderIirConfig {
            order: IirOrder::First,
            cutoff_hz,
        };
        assert!(IirLowpass::new(&config(0.0), 10_000.0).is_err());
        assert!(IirLowpass::new(&config(-5.0), 10_000.0).is_err());
        assert!(IirLowpass::new(&config(5000.0), 10_000.0).is_err());
        assert!(IirLowpass::new(&config(100.0), 0.0).is_err());
    }
}
