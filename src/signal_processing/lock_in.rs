use std::f64::consts::TAU;

use num_complex::Complex32;
use serde::Serialize;

use crate::config::{ConversionConfig, LockInConfig, LockInFilter};
use crate::error::{DspError, Result};
use crate::signal_processing::iir_lowpass::validate_cutoff;
use crate::signal_processing::{DualFilter, DualFirFilter, DualIirFilter};

/// Demodulated in-phase and quadrature components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LockInOutput {
    /// X, the component in phase with the reference
    pub in_phase: f32,
    /// Y, the component 90 degrees behind the reference
    pub quadrature: f32,
}

impl LockInOutput {
    pub fn as_complex(&self) -> Complex32 {
        Complex32::new(self.in_phase, self.quadrature)
    }

    /// R, the amplitude of the input component at the reference frequency
    pub fn magnitude(&self) -> f32 {
        self.as_complex().norm()
    }

    /// Phase of the input relative to the reference, in degrees (-180, 180]
    pub fn phase_deg(&self) -> f32 {
        self.as_complex().arg().to_degrees()
    }
}

/// Digital lock-in amplifier with an internal reference
///
/// Each input sample is multiplied by `2 cos(theta)` and `-2 sin(theta)` of the
/// reference phase, and both products go through the same dual low-pass. For
/// an input `A cos(w_ref t + phi)` the outputs settle to `A cos(phi - offset)`
/// and `A sin(phi - offset)`.
pub struct LockInAmplifier {
    low_pass: Box<dyn DualFilter + Send>,
    /// Reference phase for the next sample, radians in [0, 2 pi)
    phase: f64,
    phase_step: f64,
    phase_offset: f64,
    reference_hz: f32,
}

impl LockInAmplifier {
    pub fn new(
        config: &LockInConfig,
        sample_rate_hz: f32,
        conversion: ConversionConfig,
    ) -> Result<Self> {
        validate_cutoff(config.reference_hz, sample_rate_hz)?;
        if !config.phase_offset_deg.is_finite() {
            return Err(DspError::Config(format!(
                "reference phase offset must be finite, got {}",
                config.phase_offset_deg
            )));
        }

        let low_pass: Box<dyn DualFilter + Send> = match &config.low_pass {
            LockInFilter::Fir(fir) => Box::new(DualFirFilter::new(fir, sample_rate_hz, conversion)?),
            LockInFilter::Iir(iir) => Box::new(DualIirFilter::from_config(iir, sample_rate_hz)?),
        };
        log::debug!(
            "Lock-in: reference {} Hz, offset {} deg",
            config.reference_hz,
            config.phase_offset_deg
        );

        Ok(Self {
            low_pass,
            phase: 0.0,
            phase_step: TAU * config.reference_hz as f64 / sample_rate_hz as f64,
            phase_offset: (config.phase_offset_deg as f64).to_radians(),
            reference_hz: config.reference_hz,
        })
    }

    pub fn process(&mut self, sample: f32) -> LockInOutput {
        let (sin, cos) = (self.phase + self.phase_offset).sin_cos();
        let mixed = (2.0 * sample * cos as f32, -2.0 * sample * sin as f32);
        let (in_phase, quadrature) = self.low_pass.process_pair(mixed);

        self.phase += self.phase_step;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        LockInOutput {
            in_phase,
            quadrature,
        }
    }

    pub fn reference_hz(&self) -> f32 {
        self.reference_hz
    }
}
