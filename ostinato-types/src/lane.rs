//! Fixed-capacity cyclic lanes.
//!
//! Every lane owns its own length and read position, so lanes of different
//! lengths drift against each other and produce polymetric patterns. Storage is
//! a fixed 32-slot array; nothing here allocates.

use serde::{Deserialize, Serialize};

use crate::step::{StepModifier, TrigCondition};

/// Maximum number of steps a lane can hold.
pub const MAX_LANE_STEPS: usize = 32;

/// Velocity lane bounds (scale applied to the held note's velocity).
pub const VELOCITY_SCALE_MIN: f32 = 0.0;
pub const VELOCITY_SCALE_MAX: f32 = 1.0;
/// Gate lane bounds (multiplier on the base gate length).
pub const GATE_SCALE_MIN: f32 = 0.01;
pub const GATE_SCALE_MAX: f32 = 2.0;
/// Pitch lane bounds in semitones.
pub const PITCH_OFFSET_MIN: i8 = -24;
pub const PITCH_OFFSET_MAX: i8 = 24;
/// Ratchet lane bounds (note repeats per step).
pub const RATCHET_MIN: u8 = 1;
pub const RATCHET_MAX: u8 = 4;

/// A bounded cyclic sequence of per-step values.
#[derive(Debug, Clone, Copy)]
pub struct Lane<T> {
    values: [T; MAX_LANE_STEPS],
    length: usize,
    position: usize,
    /// Domain check for writes: `None` rejects the value and keeps the old one
    sanitize: fn(T) -> Option<T>,
}

impl<T: Copy> Lane<T> {
    /// A lane of length 1 with every slot set to `identity`.
    pub fn new(identity: T, sanitize: fn(T) -> Option<T>) -> Self {
        Self {
            values: [identity; MAX_LANE_STEPS],
            length: 1,
            position: 0,
            sanitize,
        }
    }

    /// Return the value at the read position, then step forward (wrapping).
    #[inline]
    pub fn advance(&mut self) -> T {
        let value = self.values[self.position];
        self.position = (self.position + 1) % self.length;
        value
    }

    /// Read position before the next `advance()`.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.position
    }

    /// Value the next `advance()` will return, without moving.
    #[inline]
    pub fn peek(&self) -> T {
        self.values[self.position]
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn set_length(&mut self, length: usize) {
        self.length = length.clamp(1, MAX_LANE_STEPS);
        if self.position >= self.length {
            self.position %= self.length;
        }
    }

    /// Write one slot. Out-of-range indices are ignored; the value goes through
    /// the lane's domain clamp, and rejected (non-finite) values leave the slot as is.
    pub fn set_value(&mut self, index: usize, value: T) {
        if index >= MAX_LANE_STEPS {
            return;
        }
        if let Some(v) = (self.sanitize)(value) {
            self.values[index] = v;
        }
    }

    pub fn value(&self, index: usize) -> T {
        self.values[index.min(MAX_LANE_STEPS - 1)]
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

fn sanitize_velocity(v: f32) -> Option<f32> {
    v.is_finite()
        .then(|| v.clamp(VELOCITY_SCALE_MIN, VELOCITY_SCALE_MAX))
}

fn sanitize_gate(v: f32) -> Option<f32> {
    v.is_finite().then(|| v.clamp(GATE_SCALE_MIN, GATE_SCALE_MAX))
}

fn sanitize_pitch(v: i8) -> Option<i8> {
    Some(v.clamp(PITCH_OFFSET_MIN, PITCH_OFFSET_MAX))
}

fn sanitize_ratchet(v: u8) -> Option<u8> {
    Some(v.clamp(RATCHET_MIN, RATCHET_MAX))
}

fn accept<T>(v: T) -> Option<T> {
    Some(v)
}

impl Lane<f32> {
    pub fn velocity() -> Self {
        Lane::new(1.0, sanitize_velocity)
    }

    pub fn gate() -> Self {
        Lane::new(1.0, sanitize_gate)
    }
}

impl Lane<i8> {
    pub fn pitch() -> Self {
        Lane::new(0, sanitize_pitch)
    }
}

impl Lane<u8> {
    pub fn ratchet() -> Self {
        Lane::new(1, sanitize_ratchet)
    }
}

impl Lane<StepModifier> {
    pub fn modifier() -> Self {
        Lane::new(StepModifier::Normal, accept)
    }
}

impl Lane<TrigCondition> {
    pub fn condition() -> Self {
        Lane::new(TrigCondition::Always, accept)
    }
}

/// Identifies one of the six lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneId {
    Velocity,
    Gate,
    Pitch,
    Modifier,
    Ratchet,
    Condition,
}

impl LaneId {
    pub const ALL: [LaneId; 6] = [
        LaneId::Velocity,
        LaneId::Gate,
        LaneId::Pitch,
        LaneId::Modifier,
        LaneId::Ratchet,
        LaneId::Condition,
    ];
}

/// A value written into a specific lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LaneValue {
    Velocity(f32),
    Gate(f32),
    Pitch(i8),
    Modifier(StepModifier),
    Ratchet(u8),
    Condition(TrigCondition),
}

impl LaneValue {
    pub fn lane_id(&self) -> LaneId {
        match self {
            LaneValue::Velocity(_) => LaneId::Velocity,
            LaneValue::Gate(_) => LaneId::Gate,
            LaneValue::Pitch(_) => LaneId::Pitch,
            LaneValue::Modifier(_) => LaneId::Modifier,
            LaneValue::Ratchet(_) => LaneId::Ratchet,
            LaneValue::Condition(_) => LaneId::Condition,
        }
    }
}

/// The six lanes that make up a pattern.
#[derive(Debug, Clone, Copy)]
pub struct LaneSet {
    pub velocity: Lane<f32>,
    pub gate: Lane<f32>,
    pub pitch: Lane<i8>,
    pub modifier: Lane<StepModifier>,
    pub ratchet: Lane<u8>,
    pub condition: Lane<TrigCondition>,
}

impl Default for LaneSet {
    fn default() -> Self {
        Self {
            velocity: Lane::velocity(),
            gate: Lane::gate(),
            pitch: Lane::pitch(),
            modifier: Lane::modifier(),
            ratchet: Lane::ratchet(),
            condition: Lane::condition(),
        }
    }
}

impl LaneSet {
    pub fn set_length(&mut self, lane: LaneId, length: usize) {
        match lane {
            LaneId::Velocity => self.velocity.set_length(length),
            LaneId::Gate => self.gate.set_length(length),
            LaneId::Pitch => self.pitch.set_length(length),
            LaneId::Modifier => self.modifier.set_length(length),
            LaneId::Ratchet => self.ratchet.set_length(length),
            LaneId::Condition => self.condition.set_length(length),
        }
    }

    pub fn length(&self, lane: LaneId) -> usize {
        match lane {
            LaneId::Velocity => self.velocity.length(),
            LaneId::Gate => self.gate.length(),
            LaneId::Pitch => self.pitch.length(),
            LaneId::Modifier => self.modifier.length(),
            LaneId::Ratchet => self.ratchet.length(),
            LaneId::Condition => self.condition.length(),
        }
    }

    pub fn set_value(&mut self, step: usize, value: LaneValue) {
        match value {
            LaneValue::Velocity(v) => self.velocity.set_value(step, v),
            LaneValue::Gate(v) => self.gate.set_value(step, v),
            LaneValue::Pitch(v) => self.pitch.set_value(step, v),
            LaneValue::Modifier(v) => self.modifier.set_value(step, v),
            LaneValue::Ratchet(v) => self.ratchet.set_value(step, v),
            LaneValue::Condition(v) => self.condition.set_value(step, v),
        }
    }

    pub fn reset(&mut self) {
        self.velocity.reset();
        self.gate.reset();
        self.pitch.reset();
        self.modifier.reset();
        self.ratchet.reset();
        self.condition.reset();
    }
}
