//! Per-step micro-timing, velocity and gate jitter.
//!
//! The humanize stream is drawn exactly three times per evaluated step, in the
//! order timing, velocity, gate, whether or not the step sounds. Its position is
//! therefore a function of how many steps ran, never of which ones fired.

use ostinato_types::sanitize_amount;

use crate::rng::RngStream;

/// Maximum timing deviation at full amount.
pub const MAX_TIMING_SECS: f32 = 0.020;
/// Maximum velocity deviation at full amount (MIDI units).
pub const MAX_VELOCITY_OFFSET: f32 = 15.0;
/// Maximum gate deviation at full amount, as a ratio of the gate length.
pub const MAX_GATE_RATIO: f32 = 0.10;
/// Draws consumed by every `offset()` / `discard()` call.
pub const DRAWS_PER_STEP: u64 = 3;

/// Offsets for one step. All zero when the amount is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HumanizeOffsets {
    pub timing_samples: f32,
    pub velocity: i32,
    pub gate_ratio: f32,
}

impl HumanizeOffsets {
    /// Shift the emission point, clamped into the current block.
    pub fn apply_timing(&self, offset: usize, block_size: usize) -> usize {
        let last = block_size.saturating_sub(1) as i64;
        let shifted = offset as i64 + self.timing_samples.round() as i64;
        shifted.clamp(0, last) as usize
    }

    pub fn apply_velocity(&self, velocity: u8) -> u8 {
        (velocity as i32 + self.velocity).clamp(1, 127) as u8
    }

    pub fn apply_gate(&self, gate_samples: u32) -> u32 {
        let g = gate_samples as f64;
        let adjusted = g + g * self.gate_ratio as f64;
        adjusted.round().max(1.0).min(u32::MAX as f64) as u32
    }
}

#[derive(Debug, Clone, Default)]
pub struct Humanizer {
    amount: f32,
}

impl Humanizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.amount = sanitize_amount(amount, self.amount);
    }

    /// Draw the three offsets for this step.
    #[inline]
    pub fn offset(&self, rng: &mut RngStream, sample_rate: f32) -> HumanizeOffsets {
        let timing = rng.next_bipolar();
        let velocity = rng.next_bipolar();
        let gate = rng.next_bipolar();
        let h = self.amount;
        HumanizeOffsets {
            timing_samples: timing * sample_rate * MAX_TIMING_SECS * h,
            velocity: (velocity * MAX_VELOCITY_OFFSET * h).round() as i32,
            gate_ratio: gate * MAX_GATE_RATIO * h,
        }
    }

    /// Consume this step's three draws without using them.
    #[inline]
    pub fn discard(&self, rng: &mut RngStream) {
        rng.next_u32();
        rng.next_u32();
        rng.next_u32();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44_100.0;

    fn collect(amount: f32, steps: usize) -> Vec<HumanizeOffsets> {
        let mut h = Humanizer::new();
        h.set_amount(amount);
        let mut rng = RngStream::new(0xABCD);
        (0..steps).map(|_| h.offset(&mut rng, SR)).collect()
    }

    fn std_dev(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        var.sqrt()
    }

    #[test]
    fn offset_and_discard_draw_three() {
        let h = Humanizer::new();
        let mut rng = RngStream::new(1);
        h.offset(&mut rng, SR);
        assert_eq!(rng.draws(), DRAWS_PER_STEP);
        h.discard(&mut rng);
        assert_eq!(rng.draws(), 2 * DRAWS_PER_STEP);
    }

    #[test]
    fn zero_amount_is_exact_identity() {
        for o in collect(0.0, 1000) {
            assert_eq!(o.timing_samples, 0.0);
            assert_eq!(o.velocity, 0);
            assert_eq!(o.gate_ratio, 0.0);
            assert_eq!(o.apply_timing(37, 64), 37);
            assert_eq!(o.apply_velocity(99), 99);
            assert_eq!(o.apply_gate(1234), 1234);
        }
    }

    #[test]
    fn full_amount_distribution() {
        let offsets = collect(1.0, 1000);
        let max_timing = offsets.iter().map(|o| o.timing_samples.abs()).fold(0.0, f32::max);
        let mean_timing =
            offsets.iter().map(|o| o.timing_samples.abs() as f64).sum::<f64>() / offsets.len() as f64;
        assert!(max_timing <= 882.0, "max timing {}", max_timing);
        assert!(mean_timing > 200.0, "mean timing {}", mean_timing);

        let vels: Vec<f64> = offsets.iter().map(|o| o.velocity as f64).collect();
        assert!(offsets.iter().all(|o| (-15..=15).contains(&o.velocity)));
        assert!(std_dev(&vels) > 3.0);

        let gates: Vec<f64> = offsets.iter().map(|o| o.gate_ratio as f64).collect();
        assert!(offsets.iter().all(|o| (-0.10..=0.10).contains(&o.gate_ratio)));
        assert!(std_dev(&gates) > 0.02);
    }

    #[test]
    fn half_amount_scales_linearly() {
        let full = collect(1.0, 1000);
        let half = collect(0.5, 1000);
        let max_full = full.iter().map(|o| o.timing_samples.abs()).fold(0.0, f32::max);
        let max_half = half.iter().map(|o| o.timing_samples.abs()).fold(0.0, f32::max);
        assert!((max_half - max_full * 0.5).abs() < 1.0);
        assert!(half.iter().all(|o| (-8..=8).contains(&o.velocity)));
        assert!(half.iter().all(|o| o.gate_ratio.abs() <= 0.05 + 1e-6));
        for (f, h) in full.iter().zip(&half) {
            assert!((h.gate_ratio - f.gate_ratio * 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn timing_is_clamped_after_summing() {
        let o = HumanizeOffsets { timing_samples: -500.0, velocity: 0, gate_ratio: 0.0 };
        assert_eq!(o.apply_timing(100, 512), 0);
        let o = HumanizeOffsets { timing_samples: 500.0, velocity: 0, gate_ratio: 0.0 };
        assert_eq!(o.apply_timing(100, 512), 511);
        assert_eq!(o.apply_timing(0, 1024), 500);
    }

    #[test]
    fn velocity_and_gate_clamps() {
        let o = HumanizeOffsets { timing_samples: 0.0, velocity: -15, gate_ratio: -0.1 };
        assert_eq!(o.apply_velocity(5), 1);
        assert_eq!(o.apply_gate(1), 1);
        let o = HumanizeOffsets { timing_samples: 0.0, velocity: 15, gate_ratio: 0.1 };
        assert_eq!(o.apply_velocity(120), 127);
        assert_eq!(o.apply_gate(1000), 1100);
    }
}
