use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Disturbances added to a clean test signal
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub impulse: Option<ImpulseNoiseConfig>,
    /// Constant offset in volts
    pub dc_offset: Option<f32>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_impulse(mut self, rate_hz: f32, amplitude: f32) -> Self {
        self.impulse = Some(ImpulseNoiseConfig { rate_hz, amplitude });
        self
    }

    pub fn with_dc_offset(mut self, offset: f32) -> Self {
        self.dc_offset = Some(offset);
        self
    }
}

/// White Gaussian noise at a given signal-to-noise ratio
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub snr_db: f32,
}

/// Single-sample spikes of random sign, like converter glitches
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImpulseNoiseConfig {
    /// Average spikes per second
    pub rate_hz: f32,
    pub amplitude: f32,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn signal_power(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|&x| x * x).sum::<f32>() / signal.len() as f32
}

fn apply_additive_noise(signal: &mut [f32], config: &AdditiveNoiseConfig, rng: &mut ChaCha8Rng) {
    let sig_power = signal_power(signal);
    if sig_power == 0.0 {
        return;
    }

    let snr_linear = 10.0_f32.powf(config.snr_db / 10.0);
    let noise_std = (sig_power / snr_linear).sqrt();

    let Ok(normal) = Normal::new(0.0, noise_std as f64) else {
        log::warn!("Cannot generate noise with std {}", noise_std);
        return;
    };
    for sample in signal.iter_mut() {
        *sample += normal.sample(rng) as f32;
    }
}

fn apply_impulse_noise(
    signal: &mut [f32],
    config: &ImpulseNoiseConfig,
    sample_rate: f32,
    rng: &mut ChaCha8Rng,
) {
    let n = signal.len();
    if n == 0 || config.rate_hz <= 0.0 {
        return;
    }

    let avg_samples_between_impulses = sample_rate / config.rate_hz;
    let mut pos = 0usize;
    loop {
        let interval = (rng.random::<f32>() * 2.0 * avg_samples_between_impulses) as usize;
        pos += interval.max(1);
        if pos >= n {
            break;
        }
        let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
        signal[pos] += sign * config.amplitude;
    }
}

/// Return a copy of `signal` with the configured disturbances applied
pub fn apply_noise(signal: &[f32], config: &NoiseConfig, sample_rate: f32) -> Vec<f32> {
    let mut noisy = signal.to_vec();
    let mut rng = create_rng(config.seed);

    if let Some(offset) = config.dc_offset {
        noisy.iter_mut().for_each(|s| *s += offset);
    }
    if let Some(additive) = &config.additive {
        apply_additive_noise(&mut noisy, additive, &mut rng);
    }
    if let Some(impulse) = &config.impulse {
        apply_impulse_noise(&mut noisy, impulse, sample_rate, &mut rng);
    }
    noisy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> Vec<f32> {
        (0..2000).map(|i| (i as f32 * 0.1).sin()).collect()
    }

    #[test]
    fn test_seeded_rng_reproducibility() {
        let config = NoiseConfig::default().with_seed(12345).with_awgn(20.0);
        let noisy1 = apply_noise(&clean(), &config, 8000.0);
        let noisy2 = apply_noise(&clean(), &config, 8000.0);
        assert_eq!(noisy1, noisy2);
        assert_ne!(noisy1, clean());
    }

    #[test]
    fn test_awgn_power_matches_snr() {
        let clean = clean();
        let config = NoiseConfig::default().with_seed(7).with_awgn(10.0);
        let noisy = apply_noise(&clean, &config, 8000.0);
        let noise: Vec<f32> = noisy.iter().zip(&clean).map(|(n, c)| n - c).collect();
        let snr_db = 10.0 * (signal_power(&clean) / signal_power(&noise)).log10();
        assert!((snr_db - 10.0).abs() < 1.0, "snr {} dB", snr_db);
    }

    #[test]
    fn test_dc_offset_and_impulses() {
        let zeros = vec![0.0; 8000];
        let config = NoiseConfig::default()
            .with_seed(1)
            .with_dc_offset(0.5)
            .with_impulse(100.0, 2.0);
        let noisy = apply_noise(&zeros, &config, 8000.0);
        let spikes = noisy.iter().filter(|&&s| (s - 0.5).abs() > 1.0).count();
        assert!(spikes > 50 && spikes < 150, "{} spikes", spikes);
        assert!(noisy.iter().filter(|&&s| s == 0.5).count() > 7000);
    }
}
