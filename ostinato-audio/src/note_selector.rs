//! Arpeggio ordering: which held note(s) sound on the next step.
//!
//! The voiced sequence is the held notes (sorted, or in arrival order for
//! `AsPlayed`) repeated once per extra octave. It is rebuilt on the stack each
//! step so changes to the held set take effect immediately; the cursor is
//! reduced modulo the current sequence length, which keeps it in range when
//! notes are released.

use ostinato_types::{HeldNote, NoteOrder};

use crate::held_notes::{HeldNotes, MAX_HELD_NOTES};
use crate::rng::RngStream;

const MAX_OCTAVES: usize = 4;
const MAX_SEQUENCE: usize = MAX_HELD_NOTES * MAX_OCTAVES;

/// Notes chosen for one step. Fixed capacity; never allocates.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    notes: [HeldNote; MAX_HELD_NOTES],
    len: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::empty()
    }
}

impl Selection {
    pub fn empty() -> Self {
        Self {
            notes: [HeldNote::default(); MAX_HELD_NOTES],
            len: 0,
        }
    }

    fn single(note: HeldNote) -> Self {
        let mut sel = Self::empty();
        sel.push(note);
        sel
    }

    fn push(&mut self, note: HeldNote) {
        if self.len < MAX_HELD_NOTES {
            self.notes[self.len] = note;
            self.len += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn notes(&self) -> &[HeldNote] {
        &self.notes[..self.len]
    }
}

#[derive(Debug, Clone)]
pub struct NoteSelector {
    order: NoteOrder,
    octave_range: u8,
    cursor: usize,
}

impl Default for NoteSelector {
    fn default() -> Self {
        Self::new(NoteOrder::Up, 1)
    }
}

impl NoteSelector {
    pub fn new(order: NoteOrder, octave_range: u8) -> Self {
        Self {
            order,
            octave_range: octave_range.clamp(1, MAX_OCTAVES as u8),
            cursor: 0,
        }
    }

    pub fn order(&self) -> NoteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: NoteOrder) {
        if order != self.order {
            self.order = order;
            self.cursor = 0;
        }
    }

    pub fn octave_range(&self) -> u8 {
        self.octave_range
    }

    pub fn set_octave_range(&mut self, range: u8) {
        self.octave_range = range.clamp(1, MAX_OCTAVES as u8);
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Pick this step's note(s) and move the cursor. Only `Random` and `Walk`
    /// draw from `rng`, one value per call, and only when something is held.
    pub fn advance(&mut self, held: &HeldNotes, rng: &mut RngStream) -> Selection {
        if held.is_empty() {
            return Selection::empty();
        }
        if self.order == NoteOrder::Chord {
            return self.advance_chord(held);
        }

        let source = match self.order {
            NoteOrder::AsPlayed => held.as_played(),
            _ => held.by_pitch(),
        };
        let mut sequence = [HeldNote::default(); MAX_SEQUENCE];
        let len = build_sequence(source, self.octave_range, &mut sequence);
        if len == 0 {
            return Selection::empty();
        }

        let idx = match self.order {
            NoteOrder::Up | NoteOrder::AsPlayed => {
                let idx = self.cursor % len;
                self.cursor = (idx + 1) % len;
                idx
            }
            NoteOrder::Down => {
                let pos = self.cursor % len;
                self.cursor = (pos + 1) % len;
                len - 1 - pos
            }
            NoteOrder::UpDown | NoteOrder::DownUp => {
                // Ping-pong without repeating the turnaround notes
                let period = if len > 1 { 2 * (len - 1) } else { 1 };
                let phase = self.cursor % period;
                self.cursor = (phase + 1) % period;
                let up = if phase < len { phase } else { period - phase };
                if self.order == NoteOrder::UpDown {
                    up
                } else {
                    len - 1 - up
                }
            }
            NoteOrder::Random => rng.next_below(len as u32) as usize,
            NoteOrder::Walk => {
                let idx = self.cursor.min(len - 1);
                let step_up = rng.next_unit() >= 0.5;
                self.cursor = if step_up {
                    (idx + 1).min(len - 1)
                } else {
                    idx.saturating_sub(1)
                };
                idx
            }
            NoteOrder::Chord => 0,
        };
        Selection::single(sequence[idx])
    }

    /// Every held note at once, one octave per step.
    fn advance_chord(&mut self, held: &HeldNotes) -> Selection {
        let octave = (self.cursor % self.octave_range as usize) as i16;
        self.cursor = (self.cursor + 1) % self.octave_range as usize;
        let mut sel = Selection::empty();
        for note in held.by_pitch() {
            let pitch = note.pitch as i16 + octave * 12;
            if pitch <= 127 {
                sel.push(HeldNote { pitch: pitch as u8, velocity: note.velocity });
            }
        }
        sel
    }
}

fn build_sequence(source: &[HeldNote], octaves: u8, out: &mut [HeldNote; MAX_SEQUENCE]) -> usize {
    let mut len = 0;
    for octave in 0..octaves as i16 {
        for note in source {
            let pitched = note.pitch as i16 + octave * 12;
            if (0..=127).contains(&pitched) && len < MAX_SEQUENCE {
                out[len] = HeldNote { pitch: pitched as u8, velocity: note.velocity };
                len += 1;
            }
        }
    }
    len
}
