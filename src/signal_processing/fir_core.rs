use std::ops::AddAssign;

use crate::config::{Arithmetic, BufferIndexing, ConversionConfig, FirConfig};
use crate::constants::{FIR_INPUT_PRESHIFT, FIR_OUTPUT_SHIFT};
use crate::error::Result;
use crate::signal_processing::fir_design::FirCoefficients;
use crate::signal_processing::fixed_point::CoeffFixed;
use crate::signal_processing::{Filter, MirroredBuffer};

/// Float and raw delay lines of one FIR channel
///
/// The raw line holds converter readings pre-shifted right by
/// [`FIR_INPUT_PRESHIFT`] so that the 9-bit taps and the 7-bit output shift
/// recombine to the reading's original scale.
#[derive(Debug, Clone)]
pub(crate) struct DelayLine {
    samples: MirroredBuffer<f32>,
    raw: MirroredBuffer<i32>,
}

impl DelayLine {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            samples: MirroredBuffer::new(len),
            raw: MirroredBuffer::new(len),
        }
    }

    #[inline]
    pub(crate) fn write(&mut self, cursor: usize, sample: f32, raw: i32) {
        self.samples.write(cursor, sample);
        self.raw.write(cursor, raw >> FIR_INPUT_PRESHIFT);
    }

    /// Convolve the window starting at `start` (the oldest sample)
    #[inline]
    pub(crate) fn output(
        &self,
        start: usize,
        coefficients: &FirCoefficients,
        arithmetic: Arithmetic,
        indexing: BufferIndexing,
        conversion: &ConversionConfig,
    ) -> f32 {
        match arithmetic {
            Arithmetic::Float => convolve(
                &self.samples,
                start,
                indexing,
                coefficients.taps(),
                0.0f32,
                |x: f32, h: f32| x * h,
            ),
            Arithmetic::Integer => {
                let acc = convolve(
                    &self.raw,
                    start,
                    indexing,
                    coefficients.fixed_taps(),
                    0i64,
                    |x: i32, h: CoeffFixed| x as i64 * h.to_bits(),
                );
                conversion.to_volts((acc >> FIR_OUTPUT_SHIFT) as f32)
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
        self.raw.clear();
    }
}

/// Dot product of the taps with the window at `start`
///
/// Every indexing strategy visits the same samples in ascending tap order, so
/// the accumulated result does not depend on the strategy.
#[inline]
fn convolve<T, C, A>(
    line: &MirroredBuffer<T>,
    start: usize,
    indexing: BufferIndexing,
    taps: &[C],
    zero: A,
    mul: impl Fn(T, C) -> A,
) -> A
where
    T: Copy + Default,
    C: Copy,
    A: AddAssign,
{
    let mut acc = zero;
    match indexing {
        BufferIndexing::DoubledBuffer => {
            for (&x, &h) in line.window(start).iter().zip(taps) {
                acc += mul(x, h);
            }
        }
        BufferIndexing::BranchModulo => {
            for (i, &h) in taps.iter().enumerate() {
                acc += mul(line.get_branch(start, i), h);
            }
        }
        BufferIndexing::Modulo => {
            for (i, &h) in taps.iter().enumerate() {
                acc += mul(line.get_modulo(start, i), h);
            }
        }
    }
    acc
}

/// FIR convolution filter
///
/// Each sample is written at the cursor and its mirror, the cursor advances,
/// and the output is `sum h[i] * line[cursor + i]`: after the advance the
/// cursor points at the oldest sample, so `h[0]` weights the oldest input.
/// The designed taps are symmetric, so this is the usual convolution.
pub struct FirFilter {
    coefficients: FirCoefficients,
    line: DelayLine,
    cursor: usize,
    arithmetic: Arithmetic,
    indexing: BufferIndexing,
    conversion: ConversionConfig,
}

impl FirFilter {
    /// Design the taps and size the delay line for `config`
    pub fn new(
        config: &FirConfig,
        sample_rate_hz: f32,
        conversion: ConversionConfig,
    ) -> Result<Self> {
        let coefficients = FirCoefficients::design(config, sample_rate_hz)?;
        Ok(Self::with_coefficients(
            coefficients,
            config.arithmetic,
            config.indexing,
            conversion,
        ))
    }

    pub fn with_coefficients(
        coefficients: FirCoefficients,
        arithmetic: Arithmetic,
        indexing: BufferIndexing,
        conversion: ConversionConfig,
    ) -> Self {
        if arithmetic == Arithmetic::Integer {
            log::warn!("Integer FIR arithmetic is experimental; prefer float");
        }
        log::debug!(
            "FIR filter: {} taps, {:?} arithmetic, {:?} indexing",
            coefficients.len(),
            arithmetic,
            indexing
        );
        Self {
            line: DelayLine::new(coefficients.len()),
            coefficients,
            cursor: 0,
            arithmetic,
            indexing,
            conversion,
        }
    }

    /// Filter one sample given both its calibrated and raw form
    ///
    /// Float arithmetic uses `sample`; integer arithmetic uses `raw` and
    /// converts the result to volts.
    pub fn process_sample(&mut self, sample: f32, raw: i32) -> f32 {
        self.line.write(self.cursor, sample, raw);
        self.cursor += 1;
        if self.cursor == self.coefficients.len() {
            self.cursor = 0;
        }
        self.line.output(
            self.cursor,
            &self.coefficients,
            self.arithmetic,
            self.indexing,
            &self.conversion,
        )
    }

    /// Get the number of taps (filter length)
    pub fn num_taps(&self) -> usize {
        self.coefficients.len()
    }

    /// Group delay in samples (half the filter length for linear phase)
    pub fn group_delay_samples(&self) -> usize {
        (self.coefficients.len() - 1) / 2
    }

    pub fn coefficients(&self) -> &FirCoefficients {
        &self.coefficients
    }

    pub fn arithmetic(&self) -> Arithmetic {
        self.arithmetic
    }

    pub fn indexing(&self) -> BufferIndexing {
        self.indexing
    }

    pub fn reset(&mut self) {
        self.line.clear();
        self.cursor = 0;
    }
}

impl Filter for FirFilter {
    /// The raw reading is recovered from `sample` through the conversion
    fn process(&mut self, sample: f32) -> f32 {
        let raw = self.conversion.to_raw(sample);
        self.process_sample(sample, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FirType, Window};

    fn moving_average(taps: usize, arithmetic: Arithmetic, indexing: BufferIndexing) -> FirFilter {
        FirFilter::with_coefficients(
            FirCoefficients::moving_average(taps),
            arithmetic,
            indexing,
            ConversionConfig::default(),
        )
    }

    const INDEXINGS: [BufferIndexing; 3] = [
        BufferIndexing::DoubledBuffer,
        BufferIndexing::BranchModulo,
        BufferIndexing::Modulo,
    ];

    #[test]
    fn test_moving_average_step() {
        for indexing in INDEXINGS {
            let mut fir = moving_average(4, Arithmetic::Float, indexing);
            let input = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
            let expected = [0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0];
            for (x, want) in input.iter().zip(expected) {
                let y = fir.process(*x);
                assert!((y - want).abs() < 1e-6, "{:?}: expected {}, got {}", indexing, want, y);
            }
        }
    }

    #[test]
    fn test_indexing_strategies_bit_identical() {
        let config = FirConfig {
            filter_type: FirType::BandPass,
            cutoff_hz: 2000.0,
            cutoff_high_hz: Some(6000.0),
            order: 41,
            window: Window::Hamming,
            ..FirConfig::default()
        };
        let mut filters: Vec<FirFilter> = INDEXINGS
            .iter()
            .map(|&indexing| {
                FirFilter::new(
                    &FirConfig {
                        indexing,
                        ..config.clone()
                    },
                    48_000.0,
                    ConversionConfig::default(),
                )
                .unwrap()
            })
            .collect();

        for n in 0..500 {
            let x = (n as f32 * 0.37).sin() + 0.25 * (n as f32 * 2.1).cos();
            let outputs: Vec<f32> = filters.iter_mut().map(|f| f.process(x)).collect();
            assert_eq!(outputs[0].to_bits(), outputs[1].to_bits(), "sample {}", n);
            assert_eq!(outputs[0].to_bits(), outputs[2].to_bits(), "sample {}", n);
        }
    }

    #[test]
    fn test_integer_moving_average() {
        for indexing in INDEXINGS {
            let mut fir = moving_average(4, Arithmetic::Integer, indexing);
            let outputs: Vec<f32> = (0..6).map(|_| fir.process_sample(0.0, 1024)).collect();
            assert_eq!(outputs, vec![256.0, 512.0, 768.0, 1024.0, 1024.0, 1024.0]);
        }
    }

    #[test]
    fn test_integer_applies_conversion() {
        let conversion = ConversionConfig {
            volts_per_lsb: 0.5,
            gain: 2.0,
            offset: 1.0,
        };
        let mut fir = FirFilter::with_coefficients(
            FirCoefficients::moving_average(1),
            Arithmetic::Integer,
            BufferIndexing::Modulo,
            conversion,
        );
        // 1000 >> 2 = 250, * 512 >> 7 = 1000, then 0.5 * 1000 * 2 + 1
        assert_eq!(fir.process_sample(123.0, 1000), 1001.0);
    }

    #[test]
    fn test_group_delay_and_reset() {
        let mut fir = moving_average(5, Arithmetic::Float, BufferIndexing::DoubledBuffer);
        assert_eq!(fir.num_taps(), 5);
        assert_eq!(fir.group_delay_samples(), 2);
        for _ in 0..7 {
            fir.process(3.0);
        }
        fir.reset();
        assert!((fir.process(5.0) - 1.0).abs() < 1e-6);
    }
}
