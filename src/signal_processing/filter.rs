/// Common trait for single-channel filter stages
///
/// Implemented by every stage of the signal chain. `process` is called once
/// per sample from the acquisition loop and must not allocate or block.
pub trait Filter {
    /// Process a single sample through the filter
    fn process(&mut self, sample: f32) -> f32;

    /// Process a buffer of samples in-place
    fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

/// Filters that run two signals in lockstep (lock-in in-phase/quadrature)
pub trait DualFilter {
    fn process_pair(&mut self, samples: (f32, f32)) -> (f32, f32);
}
