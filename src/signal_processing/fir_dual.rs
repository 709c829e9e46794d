use crate::config::{Arithmetic, BufferIndexing, ConversionConfig, FirConfig};
use crate::error::Result;
use crate::signal_processing::DualFilter;
use crate::signal_processing::fir_core::DelayLine;
use crate::signal_processing::fir_design::FirCoefficients;

/// Two FIR channels sharing one tap table and one cursor
///
/// Both channels advance together, so after every call they hold the same
/// number of samples and their outputs line up sample for sample. Used for
/// the in-phase and quadrature paths of the lock-in.
pub struct DualFirFilter {
    coefficients: FirCoefficients,
    lines: [DelayLine; 2],
    cursor: usize,
    arithmetic: Arithmetic,
    indexing: BufferIndexing,
    conversion: ConversionConfig,
}

impl DualFirFilter {
    pub fn new(
        config: &FirConfig,
        sample_rate_hz: f32,
        conversion: ConversionConfig,
    ) -> Result<Self> {
        let coefficients = FirCoefficients::design(config, sample_rate_hz)?;
        if config.arithmetic == Arithmetic::Integer {
            log::warn!("Integer FIR arithmetic is experimental; prefer float");
        }
        let line = DelayLine::new(coefficients.len());
        Ok(Self {
            lines: [line.clone(), line],
            coefficients,
            cursor: 0,
            arithmetic: config.arithmetic,
            indexing: config.indexing,
            conversion,
        })
    }

    /// Filter one sample per channel
    pub fn process(&mut self, samples: (f32, f32), raw: (i32, i32)) -> (f32, f32) {
        let [first, second] = &mut self.lines;
        first.write(self.cursor, samples.0, raw.0);
        second.write(self.cursor, samples.1, raw.1);
        self.cursor += 1;
        if self.cursor == self.coefficients.len() {
            self.cursor = 0;
        }
        let out = |line: &DelayLine| {
            line.output(
                self.cursor,
                &self.coefficients,
                self.arithmetic,
                self.indexing,
                &self.conversion,
            )
        };
        (out(&self.lines[0]), out(&self.lines[1]))
    }

    pub fn num_taps(&self) -> usize {
        self.coefficients.len()
    }

    pub fn reset(&mut self) {
        self.lines.iter_mut().for_each(DelayLine::clear);
        self.cursor = 0;
    }
}

impl DualFilter for DualFirFilter {
    fn process_pair(&mut self, samples: (f32, f32)) -> (f32, f32) {
        let raw = (
            self.conversion.to_raw(samples.0),
            self.conversion.to_raw(samples.1),
        );
        self.process(samples, raw)
    }
}
