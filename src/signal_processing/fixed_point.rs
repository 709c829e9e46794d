//! Scaled-integer values for the integer arithmetic paths.
//!
//! A `Fixed<F>` stores `round_toward_zero(value * 2^F)` in an `i64`. FIR taps
//! use `F = COEFF_PREC` (9 bits) and the gain stage uses `F = 32`.

use std::fmt;

use crate::constants::{COEFF_PREC, GAIN_FRAC_BITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed<const F: u32>(i64);

/// FIR tap with [`COEFF_PREC`] fractional bits
pub type CoeffFixed = Fixed<COEFF_PREC>;

/// Gain factor with 32 fractional bits
pub type GainFixed = Fixed<GAIN_FRAC_BITS>;

impl<const F: u32> Fixed<F> {
    pub const FRAC_BITS: u32 = F;
    pub const ONE: Self = Self(1 << F);

    pub const fn from_bits(bits: i64) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> i64 {
        self.0
    }

    pub fn scale() -> f64 {
        (1u64 << F) as f64
    }

    /// Value already multiplied by `2^F`, truncated toward zero
    pub fn from_scaled(scaled: f64) -> Self {
        Self(scaled as i64)
    }

    /// Truncates toward zero like a C float-to-int conversion
    pub fn from_f64(value: f64) -> Self {
        Self::from_scaled(value * Self::scale())
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::scale()
    }

    /// `(self * x) >> F` with a 128-bit intermediate
    #[inline]
    pub fn mul_int(self, x: i64) -> i64 {
        ((self.0 as i128 * x as i128) >> F) as i64
    }
}

impl<const F: u32> fmt::Display for Fixed<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/2^{}", self.0, F)
    }
}
