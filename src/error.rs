use thiserror::Error;

#[derive(Error, Debug)]
pub enum DspError {
    #[error("Invalid filter order {order}: {reason}")]
    InvalidOrder { order: usize, reason: &'static str },

    #[error("Capacity exceeded: requested {requested}, capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("Invalid averaging window {window} (history holds {capacity} samples)")]
    InvalidWindow { window: usize, capacity: usize },

    #[error("Invalid cutoff frequency: {0}")]
    InvalidCutoff(String),

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    #[error("Invalid coefficients: {0}")]
    InvalidCoefficients(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sample took {elapsed_us:.1}us, period is {period_us:.1}us (too fast to send)")]
    DeadlineMissed { elapsed_us: f32, period_us: f32 },

    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, DspError>;
