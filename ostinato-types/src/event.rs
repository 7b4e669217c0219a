//! Events produced by one processed block.

/// A note-on emitted by the step orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Position inside the current block, `0..block_size`
    pub sample_offset: usize,
    pub pitch: u8,
    /// 1-127
    pub velocity: u8,
    /// Always at least one sample
    pub gate_samples: u32,
    /// Legato into the previous note rather than a fresh attack
    pub is_tie: bool,
}

/// A note-off whose time has come due inside the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNoteOff {
    pub sample_offset: usize,
    pub pitch: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    NoteOn(StepEvent),
    NoteOff(PendingNoteOff),
}

impl EngineEvent {
    pub fn sample_offset(&self) -> usize {
        match self {
            EngineEvent::NoteOn(e) => e.sample_offset,
            EngineEvent::NoteOff(e) => e.sample_offset,
        }
    }

    pub fn pitch(&self) -> u8 {
        match self {
            EngineEvent::NoteOn(e) => e.pitch,
            EngineEvent::NoteOff(e) => e.pitch,
        }
    }

    /// Sort key: by offset, note-offs ahead of note-ons at the same sample.
    pub fn order_key(&self) -> (usize, u8) {
        match self {
            EngineEvent::NoteOff(e) => (e.sample_offset, 0),
            EngineEvent::NoteOn(e) => (e.sample_offset, 1),
        }
    }

    pub fn as_note_on(&self) -> Option<&StepEvent> {
        match self {
            EngineEvent::NoteOn(e) => Some(e),
            EngineEvent::NoteOff(_) => None,
        }
    }
}
