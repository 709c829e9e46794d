use crate::config::ScaleConfig;
use crate::error::{DspError, Result};
use crate::signal_processing::Filter;
use crate::signal_processing::fixed_point::GainFixed;

/// `value * factor`
#[inline]
pub fn scale(value: f32, factor: f32) -> f32 {
    value * factor
}

/// Integer gain: `(raw * gain) >> 32` computed in 128 bits
///
/// The result is widened to `i64` since a gain above one can push a full-scale
/// reading past `i32`.
#[inline]
pub fn scale_fixed(raw: i32, gain: GainFixed) -> i64 {
    gain.mul_int(raw as i64)
}

/// Gain stage
pub struct Scale {
    factor: f32,
    fixed: GainFixed,
}

impl Scale {
    /// # Errors
    /// Returns `DspError::Config` for a non-finite factor
    pub fn new(config: &ScaleConfig) -> Result<Self> {
        if !config.factor.is_finite() {
            return Err(DspError::Config(format!(
                "scale factor must be finite, got {}",
                config.factor
            )));
        }
        Ok(Self {
            factor: config.factor,
            fixed: GainFixed::from_f64(config.factor as f64),
        })
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Scale a raw reading with the fixed-point form of the factor
    pub fn process_raw(&self, raw: i32) -> i64 {
        scale_fixed(raw, self.fixed)
    }
}

impl Filter for Scale {
    fn process(&mut self, sample: f32) -> f32 {
        scale(sample, self.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_inverse() {
        for factor in [0.5f32, 2.0, 4.0, 0.125] {
            for x in [1.0f32, -3.5, 1024.0] {
                assert_eq!(scale(scale(x, factor), 1.0 / factor), x);
            }
        }
        assert!((scale(scale(0.3, 3.0), 1.0 / 3.0) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_gain() {
        let stage = Scale::new(&ScaleConfig { factor: 2.0 }).unwrap();
        assert_eq!(stage.process_raw(1000), 2000);
        assert_eq!(stage.process_raw(i32::MAX), 2 * i32::MAX as i64);

        let half = GainFixed::from_f64(0.5);
        assert_eq!(scale_fixed(-7, half), -4); // floor of -3.5
    }

    #[test]
    fn test_filter_impl() {
        let mut stage = Scale::new(&ScaleConfig { factor: -1.5 }).unwrap();
        assert_eq!(stage.process(2.0), -3.0);
        assert!(Scale::new(&ScaleConfig { factor: f32::NAN }).is_err());
    }
}
