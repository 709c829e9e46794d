pub mod filter;
pub mod fir_core;
pub mod fir_design;
pub mod fir_dual;
pub mod fixed_point;
pub mod iir_general;
pub mod iir_highpass;
pub mod iir_lowpass;
pub mod lock_in;
pub mod moving_average;
pub mod sample_history;
pub mod scale;

pub use filter::{DualFilter, Filter};
pub use fir_core::FirFilter;
pub use fir_design::FirCoefficients;
pub use fir_dual::DualFirFilter;
pub use fixed_point::{CoeffFixed, Fixed, GainFixed};
pub use iir_general::{DualIirFilter, IirCoefficients, IirFilter};
pub use iir_highpass::IirHighpass;
pub use iir_lowpass::IirLowpass;
pub use lock_in::{LockInAmplifier, LockInOutput};
pub use moving_average::MovingAverage;
pub use sample_history::{MirroredBuffer, SampleHistory};
pub use scale::{Scale, scale, scale_fixed};
