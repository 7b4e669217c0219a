//! Pending note-offs and deferred ratchet note-ons.
//!
//! Times are absolute sample positions counted from engine creation, so
//! entries carry across block boundaries untouched. Both queues are fixed
//! arrays; a full queue drops the new entry rather than growing.

/// Off time for a note whose length is decided by a later step (tie/slide).
pub const HELD: u64 = u64::MAX;

pub const MAX_SCHEDULED_OFFS: usize = 256;
pub const MAX_PENDING_ONS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduledOff {
    pub pitch: u8,
    pub on_at: u64,
    pub off_at: u64,
}

impl ScheduledOff {
    pub fn is_held(&self) -> bool {
        self.off_at == HELD
    }
}

/// A ratchet sub-event waiting for its subdivision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingOn {
    pub pitch: u8,
    pub velocity: u8,
    pub due: u64,
    pub gate: u32,
    /// Leave the note-off open for the following legato step
    pub hold: bool,
}

#[derive(Debug, Clone)]
pub struct NoteScheduler {
    offs: [ScheduledOff; MAX_SCHEDULED_OFFS],
    off_len: usize,
    ons: [PendingOn; MAX_PENDING_ONS],
    on_len: usize,
}

impl Default for NoteScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self {
            offs: [ScheduledOff::default(); MAX_SCHEDULED_OFFS],
            off_len: 0,
            ons: [PendingOn::default(); MAX_PENDING_ONS],
            on_len: 0,
        }
    }

    pub fn pending_offs(&self) -> &[ScheduledOff] {
        &self.offs[..self.off_len]
    }

    pub fn pending_ons(&self) -> &[PendingOn] {
        &self.ons[..self.on_len]
    }

    pub fn offs_full(&self) -> bool {
        self.off_len == MAX_SCHEDULED_OFFS
    }

    /// Register a note-on for `pitch` at `at`. Returns false (and schedules
    /// nothing) when the off queue is full. An earlier note of the same pitch
    /// still sounding at `at` is cut there, so offs never land inside a later
    /// note of the same pitch.
    pub fn note_on(&mut self, pitch: u8, at: u64, gate: u32, hold: bool) -> bool {
        if self.offs_full() {
            return false;
        }
        for off in self.offs[..self.off_len].iter_mut() {
            if off.pitch == pitch && off.on_at < at && off.off_at > at {
                off.off_at = at;
            }
        }
        let off_at = if hold { HELD } else { at.saturating_add(gate.max(1) as u64) };
        self.offs[self.off_len] = ScheduledOff { pitch, on_at: at, off_at };
        self.off_len += 1;
        true
    }

    pub fn has_held(&self) -> bool {
        self.pending_offs().iter().any(ScheduledOff::is_held)
    }

    /// Close every held note at `at` (never before its own onset).
    pub fn release_held(&mut self, at: u64) {
        for off in self.offs[..self.off_len].iter_mut() {
            if off.is_held() {
                off.off_at = at.max(off.on_at + 1);
            }
        }
    }

    /// Re-time held notes to `due`; `HELD` keeps them open.
    pub fn extend_held(&mut self, due: u64) {
        if due == HELD {
            return;
        }
        self.release_held(due);
    }

    /// Remove and return the earliest off due before `before`.
    pub fn pop_off_before(&mut self, before: u64) -> Option<ScheduledOff> {
        let idx = earliest(&self.offs[..self.off_len], |o| o.off_at, before)?;
        let off = self.offs[idx];
        self.off_len -= 1;
        self.offs[idx] = self.offs[self.off_len];
        Some(off)
    }

    /// Remove and return any off regardless of time (all-notes-off).
    pub fn pop_any_off(&mut self) -> Option<ScheduledOff> {
        if self.off_len == 0 {
            return None;
        }
        self.off_len -= 1;
        Some(self.offs[self.off_len])
    }

    pub fn push_on(&mut self, on: PendingOn) -> bool {
        if self.on_len == MAX_PENDING_ONS {
            return false;
        }
        self.ons[self.on_len] = on;
        self.on_len += 1;
        true
    }

    /// Remove and return the earliest ratchet note-on due before `before`.
    pub fn pop_on_before(&mut self, before: u64) -> Option<PendingOn> {
        let idx = earliest(&self.ons[..self.on_len], |o| o.due, before)?;
        let on = self.ons[idx];
        self.on_len -= 1;
        self.ons.copy_within(idx + 1..=self.on_len, idx);
        Some(on)
    }

    pub fn clear_ons(&mut self) {
        self.on_len = 0;
    }
}

fn earliest<T>(items: &[T], time: impl Fn(&T) -> u64, before: u64) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, item) in items.iter().enumerate() {
        let t = time(item);
        if t < before && best.map_or(true, |(_, bt)| t < bt) {
            best = Some((i, t));
        }
    }
    best.map(|(i, _)| i)
}
