//! Configuration for the DSMV filter chain.
//!
//! Every filter takes a named configuration struct. A whole processing run is
//! described by [`ChainConfig`], which loads from TOML:
//!
//! ```
//! use dsmv_dsp::config::{ChainConfig, StageConfig};
//!
//! let config = ChainConfig::from_toml_str(
//!     r#"
//!     sample_rate_hz = 80000.0
//!
//!     [[stage]]
//!     kind = "fir"
//!     filter_type = "band_pass"
//!     cutoff_hz = 2000.0
//!     cutoff_high_hz = 4000.0
//!     order = 141
//!     window = "hamming"
//!
//!     [[stage]]
//!     kind = "scale"
//!     factor = 2.0
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.stages.len(), 2);
//! assert!(matches!(config.stages[1], StageConfig::Scale(_)));
//! ```
//!
//! The board firmware passed a positional `props` vector to every filter
//! instead. [`FilterProps`] converts such a vector into the structured
//! configs with the same numeric meaning.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{LOCK_IN_DAMPING, MAX_AVERAGE_WINDOW, MAX_FIR_ORDER, MAX_IIR_HISTORY};
use crate::error::{DspError, Result};

/// Window applied to the ideal impulse response of a windowed-sinc FIR design
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// No taper
    #[default]
    Rectangular,
    /// 0.54 - 0.46 cos(2 pi i / (N - 1))
    Hamming,
}

/// FIR coefficient design
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum FirType {
    /// Uniform taps 1/N
    MovingAverage,
    #[default]
    LowPass,
    HighPass,
    BandPass,
    BandStop,
}

impl FirType {
    /// Whether the design needs `cutoff_high_hz`
    pub fn is_band(self) -> bool {
        matches!(self, FirType::BandPass | FirType::BandStop)
    }
}

/// Arithmetic used for the FIR dot product
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Arithmetic {
    /// Fixed-point taps against raw readings (experimental)
    Integer,
    #[default]
    Float,
}

/// Ring-buffer access strategy of the FIR delay line
///
/// All strategies read the same samples in the same order, so float results
/// are bit-identical. They differ only in cost per tap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BufferIndexing {
    /// `(cursor + i) % order`
    Modulo,
    /// Subtract `order` when `cursor + i` runs past the end
    BranchModulo,
    /// Read `cursor + i` directly from a buffer holding every sample twice
    #[default]
    DoubledBuffer,
}

/// Order of the fixed-form low/high-pass IIR sections
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum IirOrder {
    #[default]
    First,
    Second,
    Third,
}

impl IirOrder {
    pub fn as_usize(self) -> usize {
        match self {
            IirOrder::First => 1,
            IirOrder::Second => 2,
            IirOrder::Third => 3,
        }
    }
}

/// Conversion of raw converter readings into calibrated volts
///
/// `volts = volts_per_lsb * raw * gain + offset`. The default is the identity,
/// so integer results stay in LSB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Converter resolution in volts per LSB
    pub volts_per_lsb: f32,
    /// Gain correction
    pub gain: f32,
    /// Offset correction in volts
    pub offset: f32,
}

impl ConversionConfig {
    pub fn to_volts(&self, raw: f32) -> f32 {
        self.volts_per_lsb * raw * self.gain + self.offset
    }

    /// Inverse of [`to_volts`](Self::to_volts), truncated toward zero
    pub fn to_raw(&self, volts: f32) -> i32 {
        ((volts - self.offset) / self.gain / self.volts_per_lsb) as i32
    }

    pub fn validate(&self) -> Result<()> {
        let usable = |v: f32| v.is_finite() && v != 0.0;
        if !usable(self.volts_per_lsb) || !usable(self.gain) || !self.offset.is_finite() {
            return Err(DspError::Config(format!(
                "conversion needs finite non-zero resolution and gain, got {:?}",
                self
            )));
        }
        Ok(())
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            volts_per_lsb: 1.0,
            gain: 1.0,
            offset: 0.0,
        }
    }
}

/// Ring-buffer moving average configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AverageConfig {
    /// Number of most recent samples to average
    pub window: usize,
    /// Ring-buffer capacity
    pub capacity: usize,
}

impl Default for AverageConfig {
    fn default() -> Self {
        Self {
            window: 4,
            capacity: MAX_AVERAGE_WINDOW,
        }
    }
}

/// Fixed-form first/second/third order low-pass or high-pass configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowOrderIirConfig {
    pub order: IirOrder,
    /// Cutoff frequency in Hz
    pub cutoff_hz: f32,
}

impl Default for LowOrderIirConfig {
    fn default() -> Self {
        Self {
            order: IirOrder::First,
            cutoff_hz: 1000.0,
        }
    }
}

/// Where the general IIR filter gets its coefficient tables from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IirCoefficientSource {
    /// Inline tables. `a[0]` is the output normalisation tap.
    Taps { b: Vec<f32>, a: Vec<f32> },
    /// Two-row CSV export from PyFDA (first row b, second row a)
    Csv { path: PathBuf },
    /// Second-order bilinear low-pass section
    Bilinear { cutoff_hz: f32, damping: f32 },
}

impl Default for IirCoefficientSource {
    fn default() -> Self {
        IirCoefficientSource::Taps {
            b: vec![1.0],
            a: vec![1.0],
        }
    }
}

/// General direct-form-I IIR configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IirConfig {
    #[serde(flatten)]
    pub coefficients: IirCoefficientSource,
    /// Maximum history length for either coefficient table
    pub capacity: usize,
}

impl Default for IirConfig {
    fn default() -> Self {
        Self {
            coefficients: IirCoefficientSource::default(),
            capacity: MAX_IIR_HISTORY,
        }
    }
}

/// FIR design and convolution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirConfig {
    pub filter_type: FirType,
    /// Cutoff in Hz (lower band edge for band designs)
    pub cutoff_hz: f32,
    /// Upper band edge in Hz for band-pass and band-stop
    pub cutoff_high_hz: Option<f32>,
    /// Number of taps. Must be odd for windowed-sinc designs.
    pub order: usize,
    pub window: Window,
    pub arithmetic: Arithmetic,
    pub indexing: BufferIndexing,
    /// Largest order the delay line may be sized for
    pub max_order: usize,
}

impl Default for FirConfig {
    fn default() -> Self {
        Self {
            filter_type: FirType::LowPass,
            cutoff_hz: 1000.0,
            cutoff_high_hz: None,
            order: 31,
            window: Window::Rectangular,
            arithmetic: Arithmetic::Float,
            indexing: BufferIndexing::DoubledBuffer,
            max_order: MAX_FIR_ORDER,
        }
    }
}

/// Gain stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Amplification (> 1) or attenuation (< 1)
    pub factor: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

/// Low-pass used by the lock-in on both demodulated channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum LockInFilter {
    Fir(FirConfig),
    Iir(IirConfig),
}

/// Lock-in amplifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockInConfig {
    /// Internal reference frequency in Hz
    pub reference_hz: f32,
    /// Reference phase offset in degrees
    pub phase_offset_deg: f32,
    pub low_pass: LockInFilter,
}

impl Default for LockInConfig {
    fn default() -> Self {
        Self {
            reference_hz: 500.0,
            phase_offset_deg: 0.0,
            low_pass: LockInFilter::Iir(IirConfig {
                coefficients: IirCoefficientSource::Bilinear {
                    cutoff_hz: 50.0,
                    damping: LOCK_IN_DAMPING,
                },
                capacity: MAX_IIR_HISTORY,
            }),
        }
    }
}

/// Handling of samples whose processing exceeds the sample period
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineConfig {
    /// Abort on the first overrun instead of counting it
    pub strict: bool,
}

/// One stage of the per-sample processing chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageConfig {
    Scale(ScaleConfig),
    MovingAverage(AverageConfig),
    LowPass(LowOrderIirConfig),
    HighPass(LowOrderIirConfig),
    Iir(IirConfig),
    Fir(FirConfig),
}

/// Complete processing-run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Processing (sample) frequency in Hz
    pub sample_rate_hz: f32,
    pub conversion: ConversionConfig,
    pub deadline: DeadlineConfig,
    /// Stages applied in order to every sample
    #[serde(rename = "stage")]
    pub stages: Vec<StageConfig>,
    /// Optional lock-in demodulation of the chain output
    pub lock_in: Option<LockInConfig>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 80_000.0,
            conversion: ConversionConfig::default(),
            deadline: DeadlineConfig::default(),
            stages: Vec::new(),
            lock_in: None,
        }
    }
}

impl ChainConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| DspError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| DspError::Config(e.to_string()))
    }

    /// Checks the settings shared by all stages. Stage parameters are checked
    /// when the stages are built.
    pub fn validate(&self) -> Result<()> {
        validate_sample_rate(self.sample_rate_hz)?;
        self.conversion.validate()
    }
}

pub(crate) fn validate_sample_rate(sample_rate_hz: f32) -> Result<()> {
    if sample_rate_hz.is_finite() && sample_rate_hz > 0.0 {
        Ok(())
    } else {
        Err(DspError::InvalidSampleRate(sample_rate_hz))
    }
}

/// Positional filter properties as sent by the board's serial protocol
///
/// | slot | meaning |
/// |------|---------|
/// | 0 | cutoff frequency, averaging window or scale factor |
/// | 1 | second cutoff frequency |
/// | 2 | filter order |
/// | 3 | window selector (0 rectangular, 1 Hamming) |
/// | 4 | arithmetic/indexing selector, see [`FilterProps::fir_mode`] |
/// | 5 | processing frequency |
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterProps(pub [f32; 6]);

impl FilterProps {
    pub const CUTOFF: usize = 0;
    pub const CUTOFF_HIGH: usize = 1;
    pub const ORDER: usize = 2;
    pub const WINDOW: usize = 3;
    pub const ARITHMETIC: usize = 4;
    pub const SAMPLE_RATE: usize = 5;

    /// Build from a prefix of the props vector; missing slots are zero.
    pub fn from_slice(props: &[f32]) -> Result<Self> {
        if props.len() > 6 {
            return Err(DspError::Parse(format!(
                "expected at most 6 filter properties, got {}",
                props.len()
            )));
        }
        let mut slots = [0.0; 6];
        slots[..props.len()].copy_from_slice(props);
        Ok(Self(slots))
    }

    pub fn sample_rate_hz(&self) -> f32 {
        self.0[Self::SAMPLE_RATE]
    }

    fn integral(&self, slot: usize, what: &str) -> Result<usize> {
        let value = self.0[slot];
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(DspError::Parse(format!("{} must be a whole number, got {}", what, value)));
        }
        Ok(value as usize)
    }

    pub fn window(&self) -> Result<Window> {
        match self.integral(Self::WINDOW, "window selector")? {
            0 => Ok(Window::Rectangular),
            1 => Ok(Window::Hamming),
            code => Err(DspError::Parse(format!("unknown window selector {}", code))),
        }
    }

    /// Decodes slot 4 using the lock-in firmware's six-mode table:
    /// 0-2 integer and 3-5 float, each as doubled buffer, branch modulo, modulo.
    pub fn fir_mode(&self) -> Result<(Arithmetic, BufferIndexing)> {
        let code = self.integral(Self::ARITHMETIC, "arithmetic selector")?;
        let arithmetic = match code {
            0..=2 => Arithmetic::Integer,
            3..=5 => Arithmetic::Float,
            _ => return Err(DspError::Parse(format!("unknown arithmetic selector {}", code))),
        };
        let indexing = match code % 3 {
            0 => BufferIndexing::DoubledBuffer,
            1 => BufferIndexing::BranchModulo,
            _ => BufferIndexing::Modulo,
        };
        Ok((arithmetic, indexing))
    }

    pub fn fir_config(&self, filter_type: FirType) -> Result<FirConfig> {
        let (arithmetic, indexing) = self.fir_mode()?;
        Ok(FirConfig {
            filter_type,
            cutoff_hz: self.0[Self::CUTOFF],
            cutoff_high_hz: filter_type.is_band().then_some(self.0[Self::CUTOFF_HIGH]),
            order: self.integral(Self::ORDER, "filter order")?,
            window: self.window()?,
            arithmetic,
            indexing,
            max_order: MAX_FIR_ORDER,
        })
    }

    pub fn low_order_config(&self, order: IirOrder) -> LowOrderIirConfig {
        LowOrderIirConfig {
            order,
            cutoff_hz: self.0[Self::CUTOFF],
        }
    }

    pub fn average_config(&self) -> Result<AverageConfig> {
        Ok(AverageConfig {
            window: self.integral(Self::CUTOFF, "averaging window")?,
            capacity: MAX_AVERAGE_WINDOW,
        })
    }

    pub fn scale_config(&self) -> ScaleConfig {
        ScaleConfig {
            factor: self.0[Self::CUTOFF],
        }
    }
}
