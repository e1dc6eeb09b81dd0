//! Random index sources for line sampling.
//!
//! [`FileHandle::find_random_line`](crate::FileHandle::find_random_line) takes
//! the source as an argument, so tests can replay a fixed draw sequence.

use std::collections::VecDeque;

use rand::Rng;
use rand::rngs::ThreadRng;

/// Source of uniform integer draws.
pub trait RandomSource {
    /// Uniform integer in `[0, upper]` (inclusive).
    fn next_index(&mut self, upper: usize) -> usize;
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<ThreadRng> {
    /// Thread-local generator seeded by the OS.
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..=upper)
    }
}

/// Deterministic draws replayed in order.
///
/// Each value is clamped to the requested upper bound; once the sequence is
/// exhausted every draw is `0`.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    values: VecDeque<usize>,
}

impl SequenceSource {
    pub fn new<I: IntoIterator<Item = usize>>(values: I) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Number of draws not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for SequenceSource {
    fn next_index(&mut self, upper: usize) -> usize {
        self.values.pop_front().unwrap_or(0).min(upper)
    }
}
