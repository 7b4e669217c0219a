//! Block-level driver: step clock, pending note queues and output buffer.
//!
//! `process_block` turns the fractional samples-per-step clock into step
//! boundaries, runs the orchestrator at each one, releases queued ratchet
//! note-ons and due note-offs, and returns the block's events sorted by
//! offset. The output buffer is reserved up front; a block never allocates.

use ostinato_types::{
    ArpParams, EngineEvent, EuclideanConfig, LaneId, LaneSet, LaneValue, PendingNoteOff, StepEvent,
};

use crate::control::{ControlCmd, ControlReader, MAX_BPM, MIN_BPM};
use crate::held_notes::HeldNotes;
use crate::orchestrator::{
    has_room_for_note, push_event, BlendedStep, StepOrchestrator, StepOutcome, StepTiming,
};
use crate::overlay::VariationOverlay;
use crate::rng::{RngSeeds, RngStreams};
use crate::scheduler::NoteScheduler;

/// Output events one block can hold.
pub const EVENT_CAPACITY: usize = 2048;

pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
pub const DEFAULT_MAX_BLOCK: usize = 512;
pub const DEFAULT_BPM: f64 = 120.0;

#[derive(Debug)]
pub struct ArpEngine {
    orchestrator: StepOrchestrator,
    held: HeldNotes,
    scheduler: NoteScheduler,
    events: Vec<EngineEvent>,
    sample_rate: f64,
    max_block_size: usize,
    bpm: f64,
    /// Absolute position of the next block's first sample
    block_start: u64,
    /// Absolute, fractional position of the next step boundary
    next_step_at: f64,
    flush_pending: bool,
    steps_evaluated: u64,
    last_outcome: Option<StepOutcome>,
}

impl ArpEngine {
    pub fn new(seeds: RngSeeds, params: ArpParams) -> Self {
        Self {
            orchestrator: StepOrchestrator::new(seeds, params),
            held: HeldNotes::new(),
            scheduler: NoteScheduler::new(),
            events: Vec::with_capacity(EVENT_CAPACITY),
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: DEFAULT_MAX_BLOCK,
            bpm: DEFAULT_BPM,
            block_start: 0,
            next_step_at: 0.0,
            flush_pending: false,
            steps_evaluated: 0,
            last_outcome: None,
        }
    }

    /// Size buffers for the host's stream. Not real-time safe.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        } else {
            log::warn!(target: "audio", "invalid sample rate {}, keeping {}", sample_rate, self.sample_rate);
        }
        self.max_block_size = max_block_size.max(1);
        let capacity = EVENT_CAPACITY.max(self.max_block_size);
        if self.events.capacity() < capacity {
            self.events = Vec::with_capacity(capacity);
        }
        log::info!(
            target: "audio",
            "engine prepared: {} Hz, max block {}",
            self.sample_rate,
            self.max_block_size
        );
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Length of one step at the current tempo and rate.
    pub fn step_samples(&self) -> f64 {
        self.orchestrator.params().rate.samples_per_step(self.sample_rate, self.bpm)
    }

    /// Pull the control-plane state for this block. Call before `process_block`.
    pub fn apply_controls(&mut self, reader: &ControlReader) {
        self.orchestrator.set_spice(reader.spice());
        self.orchestrator.set_humanize(reader.humanize());
        self.orchestrator.set_fill(reader.fill());
        self.set_tempo(reader.bpm() as f64);
        if reader.take_dice() {
            self.orchestrator.regenerate_overlay();
        }
        while let Some(cmd) = reader.try_recv() {
            self.apply_cmd(cmd);
        }
    }

    fn apply_cmd(&mut self, cmd: ControlCmd) {
        match cmd {
            ControlCmd::SetLaneLength { lane, length } => self.set_lane_length(lane, length),
            ControlCmd::SetLaneValue { step, value } => self.set_lane_value(step, value),
            ControlCmd::SetEuclidean(config) => self.set_euclidean(config),
            ControlCmd::SetParams(params) => self.set_params(params),
            ControlCmd::NoteOn { pitch, velocity } => self.note_on(pitch, velocity),
            ControlCmd::NoteOff { pitch } => self.note_off(pitch),
            ControlCmd::Reset => self.reset(),
            ControlCmd::AllNotesOff => self.all_notes_off(),
        }
    }

    /// Render one block. Offsets in the result are in `0..block_size`;
    /// sizes above the prepared maximum are clamped to it.
    pub fn process_block(&mut self, block_size: usize) -> &[EngineEvent] {
        self.events.clear();
        if self.flush_pending {
            self.flush_notes();
        }
        let block_size = block_size.min(self.max_block_size);
        if block_size == 0 {
            return &self.events;
        }

        let block_start = self.block_start;
        let block_end = block_start + block_size as u64;
        let step_samples = self.step_samples();

        while self.next_step_at < block_end as f64 {
            let step_start = (self.next_step_at.floor() as u64).max(block_start);
            self.emit_due_ons(step_start);
            let timing = StepTiming {
                step_start,
                block_start,
                block_size,
                step_samples,
                sample_rate: self.sample_rate as f32,
            };
            let outcome =
                self.orchestrator
                    .fire_step(&timing, &self.held, &mut self.scheduler, &mut self.events);
            self.last_outcome = Some(outcome);
            self.steps_evaluated += 1;
            self.next_step_at += step_samples;
        }

        self.emit_due_ons(block_end);
        self.emit_due_offs(block_end);
        self.events
            .sort_unstable_by_key(|e| (e.order_key(), e.pitch()));
        self.block_start = block_end;
        &self.events
    }

    fn emit_due_ons(&mut self, before: u64) {
        while let Some(on) = self.scheduler.pop_on_before(before) {
            let at = on.due.max(self.block_start);
            let free = self.events.capacity() - self.events.len();
            if !has_room_for_note(free, &self.scheduler)
                || !self.scheduler.note_on(on.pitch, at, on.gate, on.hold)
            {
                continue;
            }
            push_event(
                &mut self.events,
                EngineEvent::NoteOn(StepEvent {
                    sample_offset: (at - self.block_start) as usize,
                    pitch: on.pitch,
                    velocity: on.velocity,
                    gate_samples: on.gate,
                    is_tie: false,
                }),
            );
        }
    }

    fn emit_due_offs(&mut self, before: u64) {
        while let Some(off) = self.scheduler.pop_off_before(before) {
            let at = off.off_at.max(self.block_start);
            push_event(
                &mut self.events,
                EngineEvent::NoteOff(PendingNoteOff {
                    sample_offset: (at - self.block_start) as usize,
                    pitch: off.pitch,
                }),
            );
        }
    }

    fn flush_notes(&mut self) {
        self.scheduler.clear_ons();
        let mut released = [false; 128];
        while let Some(off) = self.scheduler.pop_any_off() {
            let slot = &mut released[off.pitch as usize & 127];
            if !*slot {
                *slot = true;
                push_event(
                    &mut self.events,
                    EngineEvent::NoteOff(PendingNoteOff { sample_offset: 0, pitch: off.pitch }),
                );
            }
        }
        self.flush_pending = false;
    }

    pub fn set_lane_length(&mut self, lane: LaneId, length: usize) {
        self.orchestrator.lanes_mut().set_length(lane, length);
    }

    pub fn set_lane_value(&mut self, step: usize, value: LaneValue) {
        self.orchestrator.lanes_mut().set_value(step, value);
    }

    pub fn lanes(&self) -> &LaneSet {
        self.orchestrator.lanes()
    }

    pub fn spice(&self) -> f32 {
        self.orchestrator.overlay().spice()
    }

    pub fn set_spice(&mut self, amount: f32) {
        self.orchestrator.set_spice(amount);
    }

    /// Dice, applied immediately. Control-thread callers go through
    /// `ControlHandle::request_dice` instead.
    pub fn regenerate_overlay(&mut self) {
        self.orchestrator.regenerate_overlay();
    }

    pub fn overlay(&self) -> &VariationOverlay {
        self.orchestrator.overlay()
    }

    pub fn humanize(&self) -> f32 {
        self.orchestrator.humanize()
    }

    pub fn set_humanize(&mut self, amount: f32) {
        self.orchestrator.set_humanize(amount);
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.orchestrator.set_fill(fill);
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm.is_finite() {
            self.bpm = bpm.clamp(MIN_BPM as f64, MAX_BPM as f64);
        }
    }

    pub fn euclidean(&self) -> EuclideanConfig {
        self.orchestrator.euclidean()
    }

    pub fn set_euclidean(&mut self, config: EuclideanConfig) {
        self.orchestrator.set_euclidean(config);
    }

    pub fn params(&self) -> &ArpParams {
        self.orchestrator.params()
    }

    pub fn set_params(&mut self, params: ArpParams) {
        self.orchestrator.set_params(params);
    }

    pub fn held_notes(&self) -> &HeldNotes {
        &self.held
    }

    /// Input from the held-note tracker. A full buffer drops the note.
    pub fn note_on(&mut self, pitch: u8, velocity: u8) {
        self.held.note_on(pitch, velocity);
    }

    pub fn note_off(&mut self, pitch: u8) {
        self.held.note_off(pitch);
    }

    /// Transport restart: lanes, Euclidean counter, selector, loop counter and
    /// clock go back to the start; the next step lands on the next block's
    /// first sample. Random streams are not reseeded.
    pub fn reset(&mut self) {
        self.orchestrator.reset();
        self.next_step_at = self.block_start as f64;
    }

    /// Release everything at the start of the next block and drop queued ratchets.
    pub fn all_notes_off(&mut self) {
        self.flush_pending = true;
    }

    pub fn rng(&self) -> &RngStreams {
        self.orchestrator.rng()
    }

    pub fn loop_count(&self) -> u32 {
        self.orchestrator.loop_count()
    }

    pub fn steps_evaluated(&self) -> u64 {
        self.steps_evaluated
    }

    pub fn last_outcome(&self) -> Option<StepOutcome> {
        self.last_outcome
    }

    pub fn last_step(&self) -> BlendedStep {
        self.orchestrator.last_step()
    }

    /// Absolute sample position of the next block.
    pub fn position(&self) -> u64 {
        self.block_start
    }
}
