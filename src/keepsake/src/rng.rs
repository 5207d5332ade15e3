//! Injectable randomness for the draw engines
//!
//! Every draw takes a `&mut dyn RandomSource` so tests can replay exact
//! sequences and the host decides where entropy comes from.

use rand::RngCore;

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }
}

/// Adapter for any `rand` generator.
///
/// Production wiring uses `RngSource(rand::thread_rng())`; reproducible runs
/// use a seeded `SmallRng` via [`RngSource::seeded`].
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<rand::rngs::SmallRng> {
    /// Deterministic source from a 64-bit seed
    pub fn seeded(seed: u64) -> Self {
        use rand::SeedableRng;
        RngSource(rand::rngs::SmallRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> RandomSource for RngSource<R> {
    fn next_f64(&mut self) -> f64 {
        // 53 random mantissa bits, same construction rand uses for its Standard f64
        (self.0.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
///
/// Values are clamped into `[0, 1)` so a scripted `1.0` still behaves like the
/// largest possible sample.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values.into();
        assert!(!values.is_empty(), "SequenceRandom needs at least one value");
        Self { values, cursor: 0 }
    }

    /// Source that always yields `value`
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// How many samples have been drawn so far
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
