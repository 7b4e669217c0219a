use serde::{Deserialize, Serialize};

use crate::lane::MAX_LANE_STEPS;

/// Arpeggiator playback parameters (everything that is not a lane).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArpParams {
    pub note_order: NoteOrder,
    pub rate: ArpRate,
    pub octave_range: u8,    // 1-4
    pub gate_percent: f32,   // 1-200 (% of step length)
    pub accent_velocity: u8, // 0-127, added on accented steps
}

impl Default for ArpParams {
    fn default() -> Self {
        Self {
            note_order: NoteOrder::Up,
            rate: ArpRate::Sixteenth,
            octave_range: 1,
            gate_percent: 80.0,
            accent_velocity: 30,
        }
    }
}

impl ArpParams {
    /// Clamp every field into range. Non-finite gate falls back to `previous`.
    pub fn sanitized(self, previous: &ArpParams) -> ArpParams {
        let gate_percent = if self.gate_percent.is_finite() {
            self.gate_percent.clamp(1.0, 200.0)
        } else {
            previous.gate_percent
        };
        ArpParams {
            note_order: self.note_order,
            rate: self.rate,
            octave_range: self.octave_range.clamp(1, 4),
            gate_percent,
            accent_velocity: self.accent_velocity.min(127),
        }
    }
}

/// Order in which held notes are voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteOrder {
    Up,
    Down,
    UpDown,
    DownUp,
    AsPlayed,
    Random,
    /// Random walk: one step up or down the sorted sequence
    Walk,
    /// Every held note at once
    Chord,
}

impl NoteOrder {
    pub const ALL: [NoteOrder; 8] = [
        NoteOrder::Up,
        NoteOrder::Down,
        NoteOrder::UpDown,
        NoteOrder::DownUp,
        NoteOrder::AsPlayed,
        NoteOrder::Random,
        NoteOrder::Walk,
        NoteOrder::Chord,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NoteOrder::Up => "Up",
            NoteOrder::Down => "Down",
            NoteOrder::UpDown => "Up/Down",
            NoteOrder::DownUp => "Down/Up",
            NoteOrder::AsPlayed => "As Played",
            NoteOrder::Random => "Random",
            NoteOrder::Walk => "Walk",
            NoteOrder::Chord => "Chord",
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpRate {
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl ArpRate {
    pub fn name(&self) -> &'static str {
        match self {
            ArpRate::Quarter => "1/4",
            ArpRate::Eighth => "1/8",
            ArpRate::Sixteenth => "1/16",
            ArpRate::ThirtySecond => "1/32",
        }
    }

    /// Steps per beat (quarter note)
    pub fn steps_per_beat(&self) -> f64 {
        match self {
            ArpRate::Quarter => 1.0,
            ArpRate::Eighth => 2.0,
            ArpRate::Sixteenth => 4.0,
            ArpRate::ThirtySecond => 8.0,
        }
    }

    /// Length of one step in samples at the given tempo.
    pub fn samples_per_step(&self, sample_rate: f64, bpm: f64) -> f64 {
        let beats_per_second = bpm / 60.0;
        sample_rate / (beats_per_second * self.steps_per_beat())
    }
}

/// Euclidean rhythm gate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EuclideanConfig {
    pub enabled: bool,
    pub hits: u8,
    pub steps: u8,
    pub rotation: u8,
}

impl Default for EuclideanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hits: 4,
            steps: 8,
            rotation: 0,
        }
    }
}

impl EuclideanConfig {
    /// Clamp into `steps ∈ [1,32]`, `hits ∈ [0,steps]`, `rotation ∈ [0,steps)`.
    pub fn clamped(self) -> EuclideanConfig {
        let steps = self.steps.clamp(1, MAX_LANE_STEPS as u8);
        EuclideanConfig {
            enabled: self.enabled,
            hits: self.hits.min(steps),
            steps,
            rotation: self.rotation % steps,
        }
    }
}

/// A note currently held on the input side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeldNote {
    pub pitch: u8,
    pub velocity: u8,
}
