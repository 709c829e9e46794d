use std::f32::consts::PI;

use crate::config::ConversionConfig;
use crate::processing::Sample;

/// `amplitude * cos(2 pi f t + phase)` for `num_samples` samples
pub fn generate_sine(
    num_samples: usize,
    sample_rate: f32,
    freq_hz: f32,
    amplitude: f32,
    phase_degrees: f32,
) -> Vec<f32> {
    let cycles_per_sample = freq_hz as f64 / sample_rate as f64;
    let phase = phase_degrees.to_radians();
    (0..num_samples)
        .map(|i| {
            // wrapped to one cycle so long signals stay accurate in f32
            let cycles = (i as f64 * cycles_per_sample).fract() as f32;
            amplitude * (2.0 * PI * cycles + phase).cos()
        })
        .collect()
}

/// Sum of cosines, each given as `(frequency, amplitude)`
pub fn generate_tones(num_samples: usize, sample_rate: f32, tones: &[(f32, f32)]) -> Vec<f32> {
    let mut signal = vec![0.0; num_samples];
    for &(freq_hz, amplitude) in tones {
        for (s, t) in signal
            .iter_mut()
            .zip(generate_sine(num_samples, sample_rate, freq_hz, amplitude, 0.0))
        {
            *s += t;
        }
    }
    signal
}

/// Zero until `step_at`, then `amplitude`
pub fn generate_step(num_samples: usize, step_at: usize, amplitude: f32) -> Vec<f32> {
    (0..num_samples)
        .map(|i| if i >= step_at { amplitude } else { 0.0 })
        .collect()
}

/// Unit impulse at sample zero
pub fn generate_impulse(num_samples: usize) -> Vec<f32> {
    let mut signal = vec![0.0; num_samples];
    if let Some(first) = signal.first_mut() {
        *first = 1.0;
    }
    signal
}

/// Pair each voltage with its raw reading
pub fn quantize(signal: &[f32], conversion: &ConversionConfig) -> Vec<Sample> {
    signal
        .iter()
        .map(|&v| Sample::from_volts(v, conversion))
        .collect()
}
