use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::{IirCoefficientSource, IirConfig};
use crate::error::{DspError, Result};
use crate::signal_processing::iir_lowpass::validate_cutoff;
use crate::signal_processing::{DualFilter, Filter};

/// Coefficient tables of a direct-form-I IIR filter
///
/// `b` are the input taps, `a` the output taps with `a[0] == 1`. Tables whose
/// `a[0]` is not one are normalised on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct IirCoefficients {
    b: Vec<f32>,
    a: Vec<f32>,
}

impl IirCoefficients {
    /// # Errors
    /// Returns `DspError::InvalidCoefficients` for empty or non-finite tables
    /// and for `a[0] == 0`
    pub fn new(b: Vec<f32>, a: Vec<f32>) -> Result<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(DspError::InvalidCoefficients(
                "both coefficient tables need at least one tap".into(),
            ));
        }
        if b.iter().chain(a.iter()).any(|c| !c.is_finite()) {
            return Err(DspError::InvalidCoefficients("non-finite tap".into()));
        }
        let a0 = a[0];
        if a0 == 0.0 {
            return Err(DspError::InvalidCoefficients("a[0] must be non-zero".into()));
        }
        let (b, a) = if a0 == 1.0 {
            (b, a)
        } else {
            log::debug!("Normalising IIR coefficients by a[0] = {}", a0);
            (
                b.into_iter().map(|c| c / a0).collect(),
                a.into_iter().map(|c| c / a0).collect(),
            )
        };
        Ok(Self { b, a })
    }

    /// Second-order low-pass by the bilinear transform
    ///
    /// With `T = 2 tan(pi f_c / f_s)` and `D = 4 + T^2 + 2 B T`:
    /// `b = [T^2, 2 T^2, T^2] / D`, `a = [1, (2 T^2 - 8) / D, (4 - 2 B T + T^2) / D]`.
    /// `B = sqrt(2)` is Butterworth; the lock-in uses
    /// [`LOCK_IN_DAMPING`](crate::constants::LOCK_IN_DAMPING). DC gain is one.
    pub fn bilinear_lowpass(cutoff_hz: f32, sample_rate_hz: f32, damping: f32) -> Result<Self> {
        validate_cutoff(cutoff_hz, sample_rate_hz)?;
        if !damping.is_finite() || damping <= 0.0 {
            return Err(DspError::InvalidCoefficients(format!(
                "damping must be positive, got {}",
                damping
            )));
        }
        let omega = 2.0 * cutoff_hz as f64 / sample_rate_hz as f64;
        let t = 2.0 * (omega * PI / 2.0).tan();
        let t2 = t * t;
        let b = damping as f64;
        let d = 4.0 + t2 + 2.0 * b * t;
        let taps = |taps: [f64; 3]| taps.iter().map(|&c| c as f32).collect::<Vec<_>>();
        Self::new(
            taps([t2 / d, 2.0 * t2 / d, t2 / d]),
            taps([1.0, (2.0 * t2 - 8.0) / d, (-2.0 * b * t + 4.0 + t2) / d]),
        )
    }

    /// Read a two-row CSV export (first row b, second row a)
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        fs::read_to_string(path.as_ref())?.parse()
    }

    pub fn from_source(source: &IirCoefficientSource, sample_rate_hz: f32) -> Result<Self> {
        match source {
            IirCoefficientSource::Taps { b, a } => Self::new(b.clone(), a.clone()),
            IirCoefficientSource::Csv { path } => Self::from_csv_file(path),
            IirCoefficientSource::Bilinear { cutoff_hz, damping } => {
                Self::bilinear_lowpass(*cutoff_hz, sample_rate_hz, *damping)
            }
        }
    }

    pub fn b(&self) -> &[f32] {
        &self.b
    }

    pub fn a(&self) -> &[f32] {
        &self.a
    }

    fn check_capacity(&self, capacity: usize) -> Result<()> {
        let requested = self.b.len().max(self.a.len());
        if requested > capacity {
            return Err(DspError::CapacityExceeded {
                requested,
                capacity,
            });
        }
        Ok(())
    }
}

impl FromStr for IirCoefficients {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.split(',')
                    .map(str::trim)
                    .filter(|field| !field.is_empty())
                    .map(|field| {
                        field
                            .parse::<f32>()
                            .map_err(|_| DspError::Parse(format!("invalid coefficient: {}", field)))
                    })
                    .collect::<Result<Vec<f32>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        match <[Vec<f32>; 2]>::try_from(rows) {
            Ok([b, a]) => Self::new(b, a),
            Err(rows) => Err(DspError::Parse(format!(
                "expected 2 coefficient rows (b, a), got {}",
                rows.len()
            ))),
        }
    }
}

/// Past inputs and outputs of one channel, newest at index 0
#[derive(Debug, Clone)]
struct IirHistory {
    /// x_{n-i} after the shift; length `b.len()`
    inputs: Vec<f32>,
    /// y_{n-1-i}; length `a.len() - 1`
    outputs: Vec<f32>,
}

impl IirHistory {
    fn new(coefficients: &IirCoefficients) -> Self {
        Self {
            inputs: vec![0.0; coefficients.b.len()],
            outputs: vec![0.0; coefficients.a.len() - 1],
        }
    }

    /// `y_n = sum b_k x_{n-k} - sum_{k>=1} a_k y_{n-k}`, shifting both
    /// histories in the same pass as the accumulation
    #[inline]
    fn step(&mut self, coefficients: &IirCoefficients, xn: f32) -> f32 {
        let b = &coefficients.b;
        let a = &coefficients.a;
        let mut yn = 0.0;

        // Inputs shift before the tap is read, so x[i] is already x_{n-i}.
        for i in (1..b.len()).rev() {
            self.inputs[i] = self.inputs[i - 1];
            yn += b[i] * self.inputs[i];
        }
        self.inputs[0] = xn;
        yn += b[0] * xn;

        // Outputs are read before they shift, so y[k-1] is still y_{n-k}.
        for k in (1..a.len()).rev() {
            yn -= a[k] * self.outputs[k - 1];
            if k > 1 {
                self.outputs[k - 1] = self.outputs[k - 2];
            }
        }
        if let Some(newest) = self.outputs.first_mut() {
            *newest = yn;
        }
        yn
    }

    fn clear(&mut self) {
        self.inputs.fill(0.0);
        self.outputs.fill(0.0);
    }
}

/// General direct-form-I IIR filter driven by external coefficient tables
///
/// Costs O(Nb + Na) per sample.
pub struct IirFilter {
    coefficients: IirCoefficients,
    history: IirHistory,
}

impl IirFilter {
    /// # Errors
    /// Returns `DspError::CapacityExceeded` if either table is longer than
    /// `capacity`
    pub fn new(coefficients: IirCoefficients, capacity: usize) -> Result<Self> {
        coefficients.check_capacity(capacity)?;
        Ok(Self {
            history: IirHistory::new(&coefficients),
            coefficients,
        })
    }

    pub fn from_config(config: &IirConfig, sample_rate_hz: f32) -> Result<Self> {
        let coefficients = IirCoefficients::from_source(&config.coefficients, sample_rate_hz)?;
        log::debug!(
            "IIR filter: {} b taps, {} a taps",
            coefficients.b.len(),
            coefficients.a.len()
        );
        Self::new(coefficients, config.capacity)
    }

    pub fn coefficients(&self) -> &IirCoefficients {
        &self.coefficients
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Filter for IirFilter {
    fn process(&mut self, sample: f32) -> f32 {
        self.history.step(&self.coefficients, sample)
    }
}

/// Two channels through one coefficient set
pub struct DualIirFilter {
    coefficients: IirCoefficients,
    histories: [IirHistory; 2],
}

impl DualIirFilter {
    pub fn new(coefficients: IirCoefficients, capacity: usize) -> Result<Self> {
        coefficients.check_capacity(capacity)?;
        let history = IirHistory::new(&coefficients);
        Ok(Self {
            histories: [history.clone(), history],
            coefficients,
        })
    }

    pub fn from_config(config: &IirConfig, sample_rate_hz: f32) -> Result<Self> {
        let coefficients = IirCoefficients::from_source(&config.coefficients, sample_rate_hz)?;
        Self::new(coefficients, config.capacity)
    }

    pub fn reset(&mut self) {
        self.histories.iter_mut().for_each(IirHistory::clear);
    }
}

impl DualFilter for DualIirFilter {
    fn process_pair(&mut self, samples: (f32, f32)) -> (f32, f32) {
        let [first, second] = &mut self.histories;
        (
            first.step(&self.coefficients, samples.0),
            second.step(&self.coefficients, samples.1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BUTTERWORTH_DAMPING, LOCK_IN_DAMPING, MAX_IIR_HISTORY};

    fn filter(b: &[f32], a: &[f32]) -> IirFilter {
        let coefficients = IirCoefficients::new(b.to_vec(), a.to_vec()).unwrap();
        IirFilter::new(coefficients, MAX_IIR_HISTORY).unwrap()
    }

    fn impulse_response(filter: &mut IirFilter, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| filter.process(if n == 0 { 1.0 } else { 0.0 }))
            .collect()
    }

    #[test]
    fn test_identity() {
        let mut identity = filter(&[1.0], &[1.0]);
        for x in [0.0, 1.5, -3.25, 7.0, 1e-6] {
            assert_eq!(identity.process(x), x);
        }
    }

    #[test]
    fn test_input_taps_align() {
        let mut fir = filter(&[1.0, 2.0, 3.0], &[1.0]);
        assert_eq!(impulse_response(&mut fir, 5), vec![1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_output_taps_align() {
        // y_n = x_n + 0.5 y_{n-1}
        let mut first = filter(&[1.0], &[1.0, -0.5]);
        assert_eq!(impulse_response(&mut first, 4), vec![1.0, 0.5, 0.25, 0.125]);

        // y_n = x_n + 0.25 y_{n-2}
        let mut second = filter(&[1.0], &[1.0, 0.0, -0.25]);
        assert_eq!(
            impulse_response(&mut second, 5),
            vec![1.0, 0.0, 0.25, 0.0, 0.0625]
        );
    }

    #[test]
    fn test_mixed_taps() {
        // y_n = x_n + x_{n-1} - 0.5 y_{n-1} + 0.25 y_{n-3}
        let mut mixed = filter(&[1.0, 1.0], &[1.0, 0.5, 0.0, -0.25]);
        let y = impulse_response(&mut mixed, 5);
        let mut expected = [0.0f32; 5];
        for n in 0..5 {
            let x = |k: usize| if n == k { 1.0 } else { 0.0 };
            let mut v = x(0) + if n >= 1 { x(1) } else { 0.0 };
            if n >= 1 {
                v -= 0.5 * expected[n - 1];
            }
            if n >= 3 {
                v += 0.25 * expected[n - 3];
            }
            expected[n] = v;
        }
        for (got, want) in y.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{:?} vs {:?}", y, expected);
        }
    }

    #[test]
    fn test_normalises_a0() {
        let coefficients = IirCoefficients::new(vec![2.0, 2.0], vec![2.0, -1.0]).unwrap();
        assert_eq!(coefficients.b(), &[1.0, 1.0]);
        assert_eq!(coefficients.a(), &[1.0, -0.5]);
    }

    #[test]
    fn test_rejects_invalid_tables() {
        assert!(IirCoefficients::new(vec![], vec![1.0]).is_err());
        assert!(IirCoefficients::new(vec![1.0], vec![]).is_err());
        assert!(IirCoefficients::new(vec![1.0], vec![0.0]).is_err());
        assert!(IirCoefficients::new(vec![f32::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_capacity_exceeded() {
        let coefficients = IirCoefficients::new(vec![0.25; 4], vec![1.0]).unwrap();
        let err = IirFilter::new(coefficients.clone(), 3).err().unwrap();
        assert!(matches!(
            err,
            DspError::CapacityExceeded {
                requested: 4,
                capacity: 3
            }
        ));
        assert!(DualIirFilter::new(coefficients.clone(), 3).is_err());
        assert!(IirFilter::new(coefficients, 4).is_ok());
    }

    #[test]
    fn test_parse_csv() {
        let coefficients: IirCoefficients = "0.1, 0.2, 0.1\n1.0, -0.9, 0.3\n".parse().unwrap();
        assert_eq!(coefficients.b(), &[0.1, 0.2, 0.1]);
        assert_eq!(coefficients.a(), &[1.0, -0.9, 0.3]);

        assert!("0.1,0.2\n".parse::<IirCoefficients>().is_err());
        assert!("0.1,x\n1.0\n".parse::<IirCoefficients>().is_err());
        assert!("1\n1\n1\n".parse::<IirCoefficients>().is_err());
    }

    #[test]
    fn test_bilinear_unity_dc_gain() {
        for damping in [BUTTERWORTH_DAMPING, LOCK_IN_DAMPING] {
            let coefficients = IirCoefficients::bilinear_lowpass(100.0, 8000.0, damping).unwrap();
            let b_sum: f32 = coefficients.b().iter().sum();
            let a_sum: f32 = coefficients.a().iter().sum();
            assert!((b_sum / a_sum - 1.0).abs() < 1e-3);

            let mut lowpass = IirFilter::new(coefficients, MAX_IIR_HISTORY).unwrap();
            let mut y = 0.0;
            for _ in 0..4000 {
                y = lowpass.process(1.0);
            }
            assert!((y - 1.0).abs() < 1e-3, "settled at {}", y);
        }
        assert!(IirCoefficients::bilinear_lowpass(100.0, 8000.0, 0.0).is_err());
        assert!(IirCoefficients::bilinear_lowpass(5000.0, 8000.0, 1.0).is_err());
    }

    #[test]
    fn test_dual_matches_single() {
        let coefficients = IirCoefficients::bilinear_lowpass(300.0, 8000.0, LOCK_IN_DAMPING).unwrap();
        let mut dual = DualIirFilter::new(coefficients.clone(), MAX_IIR_HISTORY).unwrap();
        let mut left = IirFilter::new(coefficients.clone(), MAX_IIR_HISTORY).unwrap();
        let mut right = IirFilter::new(coefficients, MAX_IIR_HISTORY).unwrap();

        for n in 0..100 {
            let a = (n as f32 * 0.3).sin();
            let b = (n as f32 * 0.7).cos();
            let (ya, yb) = dual.process_pair((a, b));
            assert_eq!(ya, left.process(a));
            assert_eq!(yb, right.process(b));
        }
    }
}
