//! Independently seeded pseudo-random streams.
//!
//! Each generative subsystem owns exactly one stream so that randomness in one
//! never shifts or correlates with another. The generator is the same 64-bit
//! LCG used throughout the audio thread; it is allocation-free and its position
//! is tracked so tests can assert exact draw counts.

const LCG_MUL: u64 = 6364136223846793005;
const LCG_INC: u64 = 1442695040888963407;

/// One pseudo-random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngStream {
    state: u64,
    draws: u64,
}

impl RngStream {
    pub fn new(seed: u64) -> Self {
        Self { state: seed, draws: 0 }
    }

    /// Raw 32-bit draw (high half of the LCG state).
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        self.draws += 1;
        (self.state >> 32) as u32
    }

    /// Uniform in [0, 1).
    #[inline]
    pub fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in [-1, 1).
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unit() * 2.0 - 1.0
    }

    /// Uniform integer in `0..n`; `n == 0` yields 0 (still consumes a draw).
    #[inline]
    pub fn next_below(&mut self, n: u32) -> u32 {
        let r = self.next_u32();
        if n == 0 {
            0
        } else {
            r % n
        }
    }

    /// Number of values drawn since construction.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

/// Seeds for the four streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngSeeds {
    pub dice: u64,
    pub humanize: u64,
    pub condition: u64,
    pub selector: u64,
}

impl Default for RngSeeds {
    fn default() -> Self {
        Self {
            dice: 0x0D1C_E5EE_D000_0001,
            humanize: 0x4855_4D41_4E00_0002,
            condition: 0x3C0D_1710_4E00_0003,
            selector: 0x5E1E_C700_0000_0004,
        }
    }
}

/// The four streams, owned together by the step orchestrator and lent out by
/// reference to the component that needs each one.
#[derive(Debug, Clone, Copy)]
pub struct RngStreams {
    pub dice: RngStream,
    pub humanize: RngStream,
    pub condition: RngStream,
    pub selector: RngStream,
}

impl RngStreams {
    pub fn new(seeds: RngSeeds) -> Self {
        Self {
            dice: RngStream::new(seeds.dice),
            humanize: RngStream::new(seeds.humanize),
            condition: RngStream::new(seeds.condition),
            selector: RngStream::new(seeds.selector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RngStream::new(42);
        let mut b = RngStream::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        assert_eq!(a, b);
    }

    #[test]
    fn draws_are_counted() {
        let mut rng = RngStream::new(1);
        rng.next_u32();
        rng.next_unit();
        rng.next_bipolar();
        rng.next_below(4);
        assert_eq!(rng.draws(), 4);
    }

    #[test]
    fn unit_and_bipolar_ranges() {
        let mut rng = RngStream::new(7);
        for _ in 0..10_000 {
            let u = rng.next_unit();
            assert!((0.0..1.0).contains(&u));
            let b = rng.next_bipolar();
            assert!((-1.0..1.0).contains(&b));
        }
    }

    #[test]
    fn next_below_in_range() {
        let mut rng = RngStream::new(9);
        let mut seen = [false; 4];
        for _ in 0..1000 {
            seen[rng.next_below(4) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(rng.next_below(0), 0);
    }

    #[test]
    fn default_seeds_are_distinct() {
        let s = RngSeeds::default();
        let all = [s.dice, s.humanize, s.condition, s.selector];
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j]);
            }
        }
    }
}
