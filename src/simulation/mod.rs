mod measure;
mod noise;
mod signal;

pub use measure::{gain_db, measure_gain, rms, tone_amplitude};
pub use noise::{
    AdditiveNoiseConfig, ImpulseNoiseConfig, NoiseConfig, apply_noise, signal_power,
};
pub use signal::{generate_impulse, generate_sine, generate_step, generate_tones, quantize};
