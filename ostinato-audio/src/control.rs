//! Lock-free hand-off from the control thread to the audio thread.
//!
//! Continuous values (spice, humanize, tempo) are atomic floats stored as bits
//! and re-sampled every block; the last write wins. Dice is a one-shot flag
//! consumed with a compare-and-swap so each request is applied exactly once.
//! Discrete edits travel over a bounded channel drained with `try_recv`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use ostinato_types::{sanitize_amount, ArpParams, EuclideanConfig, LaneId, LaneValue};

pub const MIN_BPM: f32 = 20.0;
pub const MAX_BPM: f32 = 300.0;
pub const DEFAULT_CONTROL_CAPACITY: usize = 256;

/// Discrete edits applied on the audio thread at the top of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCmd {
    SetLaneLength { lane: LaneId, length: usize },
    SetLaneValue { step: usize, value: LaneValue },
    SetEuclidean(EuclideanConfig),
    SetParams(ArpParams),
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    Reset,
    AllNotesOff,
}

#[derive(Debug)]
struct ControlShared {
    spice: AtomicU32,
    humanize: AtomicU32,
    bpm: AtomicU32,
    fill: AtomicBool,
    dice: AtomicBool,
}

/// Writer side. Cheap to clone; every clone feeds the same reader.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    shared: Arc<ControlShared>,
    tx: Sender<ControlCmd>,
}

/// Reader side, owned by the audio thread.
#[derive(Debug)]
pub struct ControlReader {
    shared: Arc<ControlShared>,
    rx: Receiver<ControlCmd>,
}

pub fn control_pair(capacity: usize, bpm: f32) -> (ControlHandle, ControlReader) {
    let bpm = if bpm.is_finite() { bpm.clamp(MIN_BPM, MAX_BPM) } else { 120.0 };
    let shared = Arc::new(ControlShared {
        spice: AtomicU32::new(0.0_f32.to_bits()),
        humanize: AtomicU32::new(0.0_f32.to_bits()),
        bpm: AtomicU32::new(bpm.to_bits()),
        fill: AtomicBool::new(false),
        dice: AtomicBool::new(false),
    });
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (
        ControlHandle { shared: Arc::clone(&shared), tx },
        ControlReader { shared, rx },
    )
}

fn load_f32(slot: &AtomicU32) -> f32 {
    f32::from_bits(slot.load(Ordering::Relaxed))
}

impl ControlHandle {
    pub fn spice(&self) -> f32 {
        load_f32(&self.shared.spice)
    }

    pub fn set_spice(&self, amount: f32) {
        if !amount.is_finite() {
            log::warn!(target: "audio::control", "ignoring non-finite spice amount {}", amount);
        }
        let value = sanitize_amount(amount, self.spice());
        self.shared.spice.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn humanize(&self) -> f32 {
        load_f32(&self.shared.humanize)
    }

    pub fn set_humanize(&self, amount: f32) {
        if !amount.is_finite() {
            log::warn!(target: "audio::control", "ignoring non-finite humanize amount {}", amount);
        }
        let value = sanitize_amount(amount, self.humanize());
        self.shared.humanize.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn bpm(&self) -> f32 {
        load_f32(&self.shared.bpm)
    }

    pub fn set_tempo(&self, bpm: f32) {
        if !bpm.is_finite() {
            log::warn!(target: "audio::control", "ignoring non-finite tempo {}", bpm);
            return;
        }
        self.shared.bpm.store(bpm.clamp(MIN_BPM, MAX_BPM).to_bits(), Ordering::Relaxed);
    }

    pub fn set_fill(&self, fill: bool) {
        self.shared.fill.store(fill, Ordering::Relaxed);
    }

    /// Ask for one overlay regeneration. Repeated requests before the audio
    /// thread polls collapse into one.
    pub fn request_dice(&self) {
        self.shared.dice.store(true, Ordering::Release);
    }

    pub fn send_cmd(&self, cmd: ControlCmd) -> Result<(), String> {
        self.tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => {
                log::warn!(target: "audio::control", "control queue full, dropped {:?}", cmd);
                "lane edit queue full".to_string()
            }
            TrySendError::Disconnected(_) => "engine disconnected".to_string(),
        })
    }

    pub fn set_lane_length(&self, lane: LaneId, length: usize) -> Result<(), String> {
        self.send_cmd(ControlCmd::SetLaneLength { lane, length })
    }

    pub fn set_lane_value(&self, step: usize, value: LaneValue) -> Result<(), String> {
        self.send_cmd(ControlCmd::SetLaneValue { step, value })
    }

    pub fn set_euclidean(&self, config: EuclideanConfig) -> Result<(), String> {
        self.send_cmd(ControlCmd::SetEuclidean(config))
    }

    pub fn set_params(&self, params: ArpParams) -> Result<(), String> {
        self.send_cmd(ControlCmd::SetParams(params))
    }

    pub fn note_on(&self, pitch: u8, velocity: u8) -> Result<(), String> {
        self.send_cmd(ControlCmd::NoteOn { pitch, velocity })
    }

    pub fn note_off(&self, pitch: u8) -> Result<(), String> {
        self.send_cmd(ControlCmd::NoteOff { pitch })
    }

    pub fn reset(&self) -> Result<(), String> {
        self.send_cmd(ControlCmd::Reset)
    }

    pub fn all_notes_off(&self) -> Result<(), String> {
        self.send_cmd(ControlCmd::AllNotesOff)
    }
}

impl ControlReader {
    pub fn spice(&self) -> f32 {
        load_f32(&self.shared.spice)
    }

    pub fn humanize(&self) -> f32 {
        load_f32(&self.shared.humanize)
    }

    pub fn bpm(&self) -> f32 {
        load_f32(&self.shared.bpm)
    }

    pub fn fill(&self) -> bool {
        self.shared.fill.load(Ordering::Relaxed)
    }

    /// Read-and-clear the dice flag in one step.
    pub fn take_dice(&self) -> bool {
        self.shared
            .dice
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    pub fn try_recv(&self) -> Option<ControlCmd> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_sanitized_on_write() {
        let (handle, reader) = control_pair(8, 120.0);
        handle.set_spice(0.4);
        handle.set_spice(f32::NAN);
        assert_eq!(reader.spice(), 0.4);
        handle.set_spice(3.0);
        assert_eq!(reader.spice(), 1.0);
        handle.set_humanize(-1.0);
        assert_eq!(reader.humanize(), 0.0);
        handle.set_humanize(f32::INFINITY);
        assert_eq!(reader.humanize(), 0.0);
    }

    #[test]
    fn tempo_is_clamped() {
        let (handle, reader) = control_pair(8, 1000.0);
        assert_eq!(reader.bpm(), MAX_BPM);
        handle.set_tempo(5.0);
        assert_eq!(reader.bpm(), MIN_BPM);
        handle.set_tempo(f32::NAN);
        assert_eq!(reader.bpm(), MIN_BPM);
    }

    #[test]
    fn dice_is_consumed_once() {
        let (handle, reader) = control_pair(8, 120.0);
        assert!(!reader.take_dice());
        handle.request_dice();
        handle.request_dice();
        assert!(reader.take_dice());
        assert!(!reader.take_dice());
    }

    #[test]
    fn full_queue_reports_error() {
        let (handle, reader) = control_pair(2, 120.0);
        assert!(handle.note_on(60, 100).is_ok());
        assert!(handle.note_on(64, 100).is_ok());
        assert_eq!(handle.note_on(67, 100), Err("lane edit queue full".to_string()));
        assert_eq!(reader.try_recv(), Some(ControlCmd::NoteOn { pitch: 60, velocity: 100 }));
        assert_eq!(reader.try_recv(), Some(ControlCmd::NoteOn { pitch: 64, velocity: 100 }));
        assert_eq!(reader.try_recv(), None);
    }

    #[test]
    fn disconnected_reader_reports_error() {
        let (handle, reader) = control_pair(2, 120.0);
        drop(reader);
        assert_eq!(handle.reset(), Err("engine disconnected".to_string()));
    }
}
