// Small PRNG for picking wheel sectors. Not cryptographically secure.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the two random choices a spin makes.
pub trait RandomSource {
    /// Uniform integer in `[0, bound)`. `bound` is at least 1.
    fn next_index(&mut self, bound: usize) -> usize;

    /// Uniform integer in `[low, high]`.
    fn next_in_range(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        low + self.next_index((high - low) as usize + 1) as u32
    }
}

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // zero is a fixed point of xorshift
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::new(nanos ^ ((std::process::id() as u64) << 32))
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_f64_01(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl RandomSource for Prng {
    fn next_index(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        ((self.next_f64_01() * bound as f64) as usize).min(bound - 1)
    }
}
