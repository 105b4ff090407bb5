//! Seeded random stream for bout simulation.
//!
//! Every random choice in a bout comes from a single ChaCha20 stream keyed by
//! the 256-bit revealed seed. ChaCha20 is publicly specified and `rand_chacha`
//! guarantees value stability, so any third party holding the seed draws the
//! same sequence on any platform.
//!
//! # Draw contract
//!
//! All helpers consume exactly one `next_u32()` word and reduce it by modulo.
//! Verifiers in other languages reproduce a bout by following the same rule:
//!
//! - coin flip: `word % 2 == 0`
//! - index into `len` items: `word % len`
//! - percentage check `p`: `word % 100 < p`
//! - inclusive range `[min, max]`: `min + word % (max - min + 1)`

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Deterministic random stream for a single bout.
#[derive(Clone, Debug)]
pub struct FightRng {
    inner: ChaCha20Rng,
}

impl FightRng {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: ChaCha20Rng::from_seed(seed),
        }
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    /// 50/50 draw.
    pub fn coin_flip(&mut self) -> bool {
        self.next_u32() % 2 == 0
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u32() % len as u32) as usize
    }

    /// True with `percent`% probability.
    pub fn chance(&mut self, percent: u32) -> bool {
        self.next_u32() % 100 < percent
    }

    /// Uniform value in `[min, max]` inclusive. Consumes a word even when
    /// `min == max` so the stream position never depends on move data.
    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        let word = self.next_u32();
        if min >= max {
            return min;
        }
        let span = u64::from(max - min) + 1;
        min + (u64::from(word) % span) as u32
    }
}
