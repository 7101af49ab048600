//! Internal random number generator based on PCG32.
//!
//! The orchestrator's randomized timing decisions (wait duration, AI
//! false-start chance, AI false-start time, AI reaction delay) come from this
//! module rather than the `rand` crate: a minimal PCG32 is all a duel needs,
//! and a seedable generator makes whole matches reproducible in tests.
//!
//! PCG (Permuted Congruential Generator) has 64 bits of state, 32-bit output,
//! a period of 2^64, and passes TestU01. Not cryptographically secure.
//!
//! Reference: <https://www.pcg-random.org/>

use std::ops::Range;

use tracing::warn;

/// Default increment for single-stream PCG32, from the PCG paper.
const PCG_DEFAULT_INCREMENT: u64 = 1442695040888963407;

/// Standard multiplier for the 64-bit-state LCG step.
const PCG_MULTIPLIER: u64 = 6364136223846793005;

/// PCG32 random number generator (PCG-XSH-RR variant, 64-bit state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    /// Creates a generator with the given state and stream. The increment is
    /// forced odd, per the PCG seeding procedure.
    #[must_use]
    pub const fn new(state: u64, stream: u64) -> Self {
        let inc = (stream << 1) | 1;
        let mut pcg = Self { state: 0, inc };
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg.state = pcg.state.wrapping_add(state);
        pcg.state = pcg.state.wrapping_mul(PCG_MULTIPLIER).wrapping_add(pcg.inc);
        pcg
    }

    /// Creates a generator from a 64-bit seed. Equal seeds produce equal
    /// sequences; this is how tests pin down a whole match.
    #[must_use]
    pub const fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed, PCG_DEFAULT_INCREMENT)
    }

    /// Creates a generator seeded from system timing. Non-deterministic, and
    /// plenty for a game opponent; not suitable for anything secret.
    #[must_use]
    pub fn from_entropy() -> Self {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hasher};
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u128(web_time::Instant::now().elapsed().as_nanos());
        Self::seed_from_u64(hasher.finish())
    }

    /// Generates the next 32-bit value.
    #[inline]
    #[must_use]
    pub fn next_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(PCG_MULTIPLIER)
            .wrapping_add(self.inc);
        // XSH-RR output function: xor-shift high bits, then random rotate.
        let xorshifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Generates the next 64-bit value from two 32-bit draws.
    #[inline]
    #[must_use]
    pub fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_u32());
        let low = u64::from(self.next_u32());
        (high << 32) | low
    }

    /// Generates a uniform `f64` in `[0, 1)` with 53 bits of precision.
    #[inline]
    #[must_use]
    pub fn next_f64(&mut self) -> f64 {
        // Top 53 bits of a u64 scaled into the unit interval.
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Generates a uniform `f64` in `[range.start, range.end)`.
    ///
    /// # Empty Range Behavior
    /// If `range.end <= range.start`, logs a warning and returns
    /// `range.start`. Configured ranges are validated at construction, so
    /// this path is unreachable from the orchestrator.
    #[must_use]
    pub fn gen_range_f64(&mut self, range: Range<f64>) -> f64 {
        let span = range.end - range.start;
        if !span.is_finite() || span <= 0.0 {
            if span < 0.0 {
                warn!(
                    start = range.start,
                    end = range.end,
                    "gen_range_f64 called with an inverted range"
                );
            }
            return range.start;
        }
        range.start + self.next_f64() * span
    }

    /// Generates `true` with the given probability. Values outside
    /// `[0.0, 1.0]` are clamped.
    #[must_use]
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        let p = probability.clamp(0.0, 1.0);
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.next_f64() < p
    }
}
