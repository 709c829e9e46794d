//! Fixed-capacity circular sample storage.
//!
//! [`SampleHistory`] owns its write cursor and is used where one filter walks
//! back over its own past samples. [`MirroredBuffer`] is the doubled layout of
//! the FIR delay line: every sample is stored twice so that a window of
//! `order` consecutive samples is contiguous from any start in `[0, order)`.
//! Its cursor is owned by the filter so two channels can share one.

/// Circular history of the most recent `capacity` samples
#[derive(Debug, Clone)]
pub struct SampleHistory<T> {
    storage: Vec<T>,
    cursor: usize,
}

impl<T: Copy + Default> SampleHistory<T> {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            storage: vec![T::default(); capacity],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Position the next [`push`](Self::push) writes to
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Overwrite the oldest slot with `value` and advance the cursor
    pub fn push(&mut self, value: T) {
        self.storage[self.cursor] = value;
        self.cursor += 1;
        if self.cursor == self.storage.len() {
            self.cursor = 0;
        }
    }

    /// The sample written `age` pushes ago (0 is the most recent)
    ///
    /// # Panics
    /// Panics if `age >= capacity`.
    pub fn latest(&self, age: usize) -> T {
        let n = self.storage.len();
        assert!(age < n, "age {} beyond history capacity {}", age, n);
        let newest = if self.cursor == 0 { n - 1 } else { self.cursor - 1 };
        if newest >= age {
            self.storage[newest - age]
        } else {
            self.storage[n + newest - age]
        }
    }

    /// Iterate the `count` most recent samples, newest first
    pub fn iter_latest(&self, count: usize) -> impl Iterator<Item = T> + '_ {
        (0..count.min(self.storage.len())).map(move |age| self.latest(age))
    }

    pub fn clear(&mut self) {
        self.storage.fill(T::default());
        self.cursor = 0;
    }
}

/// Delay line stored twice over for modulo-free windowed reads
#[derive(Debug, Clone)]
pub struct MirroredBuffer<T> {
    storage: Vec<T>,
    len: usize,
}

impl<T: Copy + Default> MirroredBuffer<T> {
    /// # Panics
    /// Panics if `len` is zero.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "delay line length must be non-zero");
        Self {
            storage: vec![T::default(); 2 * len],
            len,
        }
    }

    /// Logical length (half the storage)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `value` at `cursor` and at its mirror `cursor + len`
    #[inline]
    pub fn write(&mut self, cursor: usize, value: T) {
        self.storage[cursor] = value;
        self.storage[cursor + self.len] = value;
    }

    /// Contiguous window of `len` samples starting at `start`
    #[inline]
    pub fn window(&self, start: usize) -> &[T] {
        &self.storage[start..start + self.len]
    }

    /// Read `start + i` wrapped with the remainder operator
    #[inline]
    pub fn get_modulo(&self, start: usize, i: usize) -> T {
        self.storage[(start + i) % self.len]
    }

    /// Read `start + i` wrapped with a compare and subtract
    #[inline]
    pub fn get_branch(&self, start: usize, i: usize) -> T {
        let idx = start + i;
        if idx >= self.len {
            self.storage[idx - self.len]
        } else {
            self.storage[idx]
        }
    }

    pub fn clear(&mut self) {
        self.storage.fill(T::default());
    }
}
