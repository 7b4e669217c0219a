//! Fixed-capacity buffer of the notes currently held on the input side.

use ostinato_types::HeldNote;

pub const MAX_HELD_NOTES: usize = 32;

/// Held notes, kept both in arrival order and sorted by pitch.
#[derive(Debug, Clone)]
pub struct HeldNotes {
    played: [HeldNote; MAX_HELD_NOTES],
    sorted: [HeldNote; MAX_HELD_NOTES],
    len: usize,
}

impl Default for HeldNotes {
    fn default() -> Self {
        Self::new()
    }
}

impl HeldNotes {
    pub fn new() -> Self {
        Self {
            played: [HeldNote::default(); MAX_HELD_NOTES],
            sorted: [HeldNote::default(); MAX_HELD_NOTES],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.as_played().iter().any(|n| n.pitch == pitch)
    }

    /// Arrival order.
    pub fn as_played(&self) -> &[HeldNote] {
        &self.played[..self.len]
    }

    /// Ascending pitch.
    pub fn by_pitch(&self) -> &[HeldNote] {
        &self.sorted[..self.len]
    }

    /// Add a note, or refresh the velocity of one already held. Returns false
    /// when the buffer is full. Velocity 0 is treated as a release.
    pub fn note_on(&mut self, pitch: u8, velocity: u8) -> bool {
        let pitch = pitch.min(127);
        if velocity == 0 {
            self.note_off(pitch);
            return true;
        }
        let velocity = velocity.min(127);
        if let Some(note) = self.played[..self.len].iter_mut().find(|n| n.pitch == pitch) {
            note.velocity = velocity;
            self.rebuild_sorted();
            return true;
        }
        if self.len == MAX_HELD_NOTES {
            return false;
        }
        self.played[self.len] = HeldNote { pitch, velocity };
        self.len += 1;
        self.rebuild_sorted();
        true
    }

    pub fn note_off(&mut self, pitch: u8) {
        if let Some(idx) = self.as_played().iter().position(|n| n.pitch == pitch) {
            self.played.copy_within(idx + 1..self.len, idx);
            self.len -= 1;
            self.rebuild_sorted();
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn rebuild_sorted(&mut self) {
        self.sorted[..self.len].copy_from_slice(&self.played[..self.len]);
        // Insertion sort: at most 32 entries, no allocation
        for i in 1..self.len {
            let mut j = i;
            while j > 0 && self.sorted[j - 1].pitch > self.sorted[j].pitch {
                self.sorted.swap(j - 1, j);
                j -= 1;
            }
        }
    }
}
