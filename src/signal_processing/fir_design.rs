use std::f64::consts::PI;

use num_complex::Complex64;

use crate::config::{FirConfig, FirType, Window, validate_sample_rate};
use crate::constants::COEFF_PREC;
use crate::error::{DspError, Result};
use crate::signal_processing::fixed_point::CoeffFixed;

/// FIR taps in float and fixed-point form
///
/// Both tables come out of the same design; the fixed table is the float
/// impulse response scaled by `2^COEFF_PREC` and truncated, so it is what the
/// integer convolution path multiplies raw readings with.
#[derive(Debug, Clone, PartialEq)]
pub struct FirCoefficients {
    float: Vec<f32>,
    fixed: Vec<CoeffFixed>,
}

impl FirCoefficients {
    /// Design the taps described by `config` for the given processing frequency
    ///
    /// Windowed-sinc designs are centred on tap `M = (N - 1) / 2` and need an
    /// odd number of taps. The moving average accepts any length.
    ///
    /// # Errors
    /// - `DspError::InvalidOrder` for zero, even (sinc) or oversized orders,
    ///   or a Hamming window shorter than 3 taps
    /// - `DspError::InvalidCutoff` for cutoffs outside `(0, f_s/2)` or a
    ///   missing/inverted upper band edge
    pub fn design(config: &FirConfig, sample_rate_hz: f32) -> Result<Self> {
        validate_sample_rate(sample_rate_hz)?;
        let n = config.order;
        if n == 0 {
            return Err(DspError::InvalidOrder {
                order: n,
                reason: "a FIR filter needs at least one tap",
            });
        }
        if n > config.max_order {
            return Err(DspError::InvalidOrder {
                order: n,
                reason: "more taps than the delay line allows",
            });
        }

        if config.filter_type == FirType::MovingAverage {
            return Ok(Self::moving_average(n));
        }

        if n % 2 == 0 {
            return Err(DspError::InvalidOrder {
                order: n,
                reason: "windowed-sinc designs need an odd number of taps",
            });
        }
        if config.window == Window::Hamming && n < 3 {
            return Err(DspError::InvalidOrder {
                order: n,
                reason: "the Hamming window needs at least 3 taps",
            });
        }

        let fs = sample_rate_hz as f64;
        let phi = normalized_edge(config.cutoff_hz, sample_rate_hz)?;
        let phi_high = if config.filter_type.is_band() {
            let high = config.cutoff_high_hz.ok_or_else(|| {
                DspError::InvalidCutoff(format!("{:?} needs cutoff_high_hz", config.filter_type))
            })?;
            let phi_high = normalized_edge(high, sample_rate_hz)?;
            if phi_high <= phi {
                return Err(DspError::InvalidCutoff(format!(
                    "upper band edge {} Hz must be above {} Hz",
                    high, config.cutoff_hz
                )));
            }
            phi_high
        } else {
            0.0
        };

        let m = (n - 1) / 2;
        let mut float = Vec::with_capacity(n);
        let mut fixed = Vec::with_capacity(n);
        for i in 0..n {
            let k = i as f64 - m as f64;
            let ideal = ideal_tap(config.filter_type, phi, phi_high, k);
            let scaled = ideal * CoeffFixed::scale();
            // The window is unity at the centre, which is left untouched.
            let w = if i == m {
                1.0
            } else {
                window_factor(config.window, i, n)
            };
            float.push((ideal * w) as f32);
            fixed.push(CoeffFixed::from_scaled(scaled * w));
        }

        log::debug!(
            "Designed {:?} FIR: {} taps, fc={} Hz, fs={} Hz, window {:?}",
            config.filter_type,
            n,
            config.cutoff_hz,
            fs,
            config.window
        );
        Ok(Self { float, fixed })
    }

    /// Uniform taps `1/N`; the fixed table is `2^COEFF_PREC / N` in integer
    /// division
    pub fn moving_average(taps: usize) -> Self {
        let taps = taps.max(1);
        Self {
            float: vec![1.0 / taps as f32; taps],
            fixed: vec![CoeffFixed::from_bits((1i64 << COEFF_PREC) / taps as i64); taps],
        }
    }

    /// Use an externally designed tap table
    pub fn from_taps(taps: Vec<f32>) -> Result<Self> {
        if taps.is_empty() || taps.iter().any(|t| !t.is_finite()) {
            return Err(DspError::InvalidCoefficients(
                "FIR taps must be finite and non-empty".into(),
            ));
        }
        let fixed = taps.iter().map(|&t| CoeffFixed::from_f64(t as f64)).collect();
        Ok(Self { float: taps, fixed })
    }

    pub fn taps(&self) -> &[f32] {
        &self.float
    }

    pub fn fixed_taps(&self) -> &[CoeffFixed] {
        &self.fixed
    }

    pub fn len(&self) -> usize {
        self.float.len()
    }

    pub fn is_empty(&self) -> bool {
        self.float.is_empty()
    }

    /// Magnitude response at `freq_hz`
    pub fn magnitude_at(&self, freq_hz: f32, sample_rate_hz: f32) -> f32 {
        let omega = 2.0 * PI * freq_hz as f64 / sample_rate_hz as f64;
        let response: Complex64 = self
            .float
            .iter()
            .enumerate()
            .map(|(i, &h)| Complex64::from_polar(h as f64, -omega * i as f64))
            .sum();
        response.norm() as f32
    }
}

/// Band edge as `2 pi f / f_s`
fn normalized_edge(cutoff_hz: f32, sample_rate_hz: f32) -> Result<f64> {
    if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= sample_rate_hz / 2.0 {
        return Err(DspError::InvalidCutoff(format!(
            "band edge {} Hz outside (0, {}) Hz",
            cutoff_hz,
            sample_rate_hz / 2.0
        )));
    }
    Ok(2.0 * PI * cutoff_hz as f64 / sample_rate_hz as f64)
}

/// Ideal (unwindowed) impulse response at offset `k` from the centre
fn ideal_tap(filter_type: FirType, phi: f64, phi_high: f64, k: f64) -> f64 {
    if k == 0.0 {
        return match filter_type {
            FirType::LowPass => phi / PI,
            FirType::HighPass => 1.0 - phi / PI,
            FirType::BandPass => (phi_high - phi) / PI,
            FirType::BandStop => 1.0 - (phi_high - phi) / PI,
            FirType::MovingAverage => 0.0,
        };
    }
    let sinc = |w: f64| (w * k).sin() / (PI * k);
    match filter_type {
        FirType::LowPass => sinc(phi),
        FirType::HighPass => -sinc(phi),
        FirType::BandPass => sinc(phi_high) - sinc(phi),
        FirType::BandStop => sinc(phi) - sinc(phi_high),
        FirType::MovingAverage => 0.0,
    }
}

fn window_factor(window: Window, i: usize, n: usize) -> f64 {
    match window {
        Window::Rectangular => 1.0,
        Window::Hamming => 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos(),
    }
}
