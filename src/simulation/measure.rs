use std::f32::consts::PI;

use crate::signal_processing::Filter;

use super::generate_sine;

pub fn rms(signal: &[f32]) -> f32 {
    super::signal_power(signal).sqrt()
}

/// Amplitude of the `freq_hz` component by correlation with cos and sin
///
/// Exact when `signal` spans a whole number of periods.
pub fn tone_amplitude(signal: &[f32], freq_hz: f32, sample_rate: f32) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    let omega = 2.0 * PI * freq_hz / sample_rate;
    let (mut i_sum, mut q_sum) = (0.0f64, 0.0f64);
    for (n, &x) in signal.iter().enumerate() {
        let phase = (omega as f64 * n as f64) % std::f64::consts::TAU;
        i_sum += x as f64 * phase.cos();
        q_sum += x as f64 * phase.sin();
    }
    let n = signal.len() as f64;
    (2.0 * (i_sum * i_sum + q_sum * q_sum).sqrt() / n) as f32
}

pub fn gain_db(input_amplitude: f32, output_amplitude: f32) -> f32 {
    20.0 * (output_amplitude / input_amplitude).log10()
}

/// Steady-state gain of `filter` at `freq_hz`
///
/// Runs `settle + measure` samples of a unit cosine and measures the tone in
/// the last `measure` samples.
pub fn measure_gain<F: Filter + ?Sized>(
    filter: &mut F,
    freq_hz: f32,
    sample_rate: f32,
    settle: usize,
    measure: usize,
) -> f32 {
    let mut signal = generate_sine(settle + measure, sample_rate, freq_hz, 1.0, 0.0);
    filter.process_buffer(&mut signal);
    tone_amplitude(&signal[settle..], freq_hz, sample_rate)
}
