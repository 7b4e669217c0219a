//! Spice/Dice variation overlay.
//!
//! Four overlay arrays run parallel to the velocity, gate, ratchet and
//! condition lanes. `regenerate()` (Dice) refills them from the dice stream;
//! the spice amount then blends each lane value toward its overlay slot.

use ostinato_types::lane::{RATCHET_MAX, RATCHET_MIN};
use ostinato_types::{sanitize_amount, TrigCondition, MAX_LANE_STEPS};

use crate::rng::RngStream;

/// Values drawn by one `regenerate()` call: 32 per array, four arrays.
pub const DRAWS_PER_REGENERATE: u64 = 4 * MAX_LANE_STEPS as u64;

#[derive(Debug, Clone)]
pub struct VariationOverlay {
    velocity: [f32; MAX_LANE_STEPS],
    gate: [f32; MAX_LANE_STEPS],
    ratchet: [u8; MAX_LANE_STEPS],
    condition: [TrigCondition; MAX_LANE_STEPS],
    spice: f32,
}

impl Default for VariationOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl VariationOverlay {
    /// Overlay content starts equal to the lanes' identity values, so any
    /// spice amount is a no-op until the first regenerate.
    pub fn new() -> Self {
        Self {
            velocity: [1.0; MAX_LANE_STEPS],
            gate: [1.0; MAX_LANE_STEPS],
            ratchet: [1; MAX_LANE_STEPS],
            condition: [TrigCondition::Always; MAX_LANE_STEPS],
            spice: 0.0,
        }
    }

    /// Refill all four arrays. Draw order is fixed: velocity, gate, ratchet, condition.
    /// Ratchet and condition slots always move to a different value; one draw per slot.
    pub fn regenerate(&mut self, rng: &mut RngStream) {
        for v in self.velocity.iter_mut() {
            *v = rng.next_unit();
        }
        for g in self.gate.iter_mut() {
            *g = rng.next_unit();
        }
        let span = (RATCHET_MAX - RATCHET_MIN + 1) as u32;
        for r in self.ratchet.iter_mut() {
            let previous = (*r - RATCHET_MIN) as u32;
            *r = RATCHET_MIN + skip_past(rng.next_below(span - 1), previous) as u8;
        }
        let conditions = TrigCondition::ALL.len() as u32;
        for c in self.condition.iter_mut() {
            let previous = c.index() as u32;
            *c = TrigCondition::from_index(skip_past(rng.next_below(conditions - 1), previous) as usize);
        }
    }

    pub fn spice(&self) -> f32 {
        self.spice
    }

    pub fn set_spice(&mut self, amount: f32) {
        self.spice = sanitize_amount(amount, self.spice);
    }

    pub fn velocity(&self, index: usize) -> f32 {
        self.velocity[index % MAX_LANE_STEPS]
    }

    pub fn gate(&self, index: usize) -> f32 {
        self.gate[index % MAX_LANE_STEPS]
    }

    pub fn ratchet(&self, index: usize) -> u8 {
        self.ratchet[index % MAX_LANE_STEPS]
    }

    pub fn condition(&self, index: usize) -> TrigCondition {
        self.condition[index % MAX_LANE_STEPS]
    }

    #[inline]
    pub fn blend_velocity(&self, original: f32, index: usize) -> f32 {
        lerp(original, self.velocity(index), self.spice)
    }

    #[inline]
    pub fn blend_gate(&self, original: f32, index: usize) -> f32 {
        lerp(original, self.gate(index), self.spice)
    }

    /// Rounded (half away from zero), then clamped to the ratchet domain.
    #[inline]
    pub fn blend_ratchet(&self, original: u8, index: usize) -> u8 {
        let blended = lerp(original as f32, self.ratchet(index) as f32, self.spice);
        (blended.round() as u8).clamp(RATCHET_MIN, RATCHET_MAX)
    }

    /// Enums have no midpoint: switch over at half spice.
    #[inline]
    pub fn blend_condition(&self, original: TrigCondition, index: usize) -> TrigCondition {
        if self.spice >= 0.5 {
            self.condition(index)
        } else {
            original
        }
    }
}

/// Map a draw from `0..n-1` onto `0..n` minus `previous`.
#[inline]
fn skip_past(draw: u32, previous: u32) -> u32 {
    if draw >= previous {
        draw + 1
    } else {
        draw
    }
}

/// `a + (b - a) * t`, returning the endpoints bit-exactly at `t == 0` and `t == 1`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}
