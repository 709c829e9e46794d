pub mod acquisition;
pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod processing;
pub mod signal_processing;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::ChainConfig;
pub use error::{DspError, Result};
pub use processing::{ChainOutput, Sample, SignalChain};
pub use wav::{save_wav, save_wav_raw};
