//! Fixed limits and scale factors shared by the filter implementations.
//!
//! The capacities mirror the static buffers of the board firmware. Filters
//! take their capacity from configuration and fall back to these values.

/// Precision (bits) of the FIR coefficients used by integer arithmetic.
pub const COEFF_PREC: u32 = 9;

/// Raw readings are stored pre-shifted by this many bits in the integer FIR
/// delay line. Together with [`FIR_OUTPUT_SHIFT`] the total is [`COEFF_PREC`].
pub const FIR_INPUT_PRESHIFT: u32 = COEFF_PREC - FIR_OUTPUT_SHIFT;

/// Right shift applied to the integer FIR accumulator.
pub const FIR_OUTPUT_SHIFT: u32 = 7;

/// Fractional bits of the integer gain factor used by the scale stage.
pub const GAIN_FRAC_BITS: u32 = 32;

/// Maximum half FIR order (number of taps on either side of the center tap).
pub const MAX_FIR_HALF_ORDER: usize = 100;

/// Default maximum number of FIR taps.
pub const MAX_FIR_ORDER: usize = 2 * MAX_FIR_HALF_ORDER + 1;

/// Default history capacity of the general IIR filter.
pub const MAX_IIR_HISTORY: usize = 200;

/// Default capacity of the moving-average ring buffer.
pub const MAX_AVERAGE_WINDOW: usize = 256;

/// Damping constant of the lock-in second-order low-pass section.
pub const LOCK_IN_DAMPING: f32 = 1.931_851_7;

/// Damping constant giving a maximally flat (Butterworth) second-order section.
pub const BUTTERWORTH_DAMPING: f32 = std::f32::consts::SQRT_2;
