//! The per-step evaluation pipeline.
//!
//! `fire_step` runs once per step boundary. Lane reads, the selector, the
//! Euclidean counter and loop bookkeeping always advance; the remaining stages
//! may bail out early (rest, failed condition, tie), but every path consumes
//! exactly three humanize draws before returning. Nothing here allocates, logs
//! or panics.

use ostinato_types::{
    ArpParams, EngineEvent, EuclideanConfig, LaneSet, StepEvent, StepModifier, TrigCondition,
};

use crate::condition::ConditionEvaluator;
use crate::held_notes::HeldNotes;
use crate::humanizer::Humanizer;
use crate::note_selector::NoteSelector;
use crate::overlay::VariationOverlay;
use crate::pattern_gate::PatternGate;
use crate::rng::{RngSeeds, RngStreams};
use crate::scheduler::{NoteScheduler, PendingOn, HELD};

/// Where a step falls, in absolute samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTiming {
    /// Step boundary (floor of the fractional clock position)
    pub step_start: u64,
    pub block_start: u64,
    pub block_size: usize,
    /// Fractional length of one step
    pub step_samples: f64,
    pub sample_rate: f32,
}

/// How a step resolved. Every variant consumed three humanize draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Fired { notes: u8, ratchets: u8 },
    EuclideanRest,
    ConditionFailed,
    Rest,
    /// Held notes sustained through this step
    Tied,
    TieWithoutPredecessor,
    /// Nothing held to voice
    NoNote,
}

impl StepOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, StepOutcome::Fired { .. })
    }
}

/// Lane values for one step after the overlay blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendedStep {
    pub velocity: f32,
    pub gate: f32,
    pub pitch: i8,
    pub modifier: StepModifier,
    pub ratchet: u8,
    pub condition: TrigCondition,
}

impl Default for BlendedStep {
    fn default() -> Self {
        Self {
            velocity: 1.0,
            gate: 1.0,
            pitch: 0,
            modifier: StepModifier::Normal,
            ratchet: 1,
            condition: TrigCondition::Always,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepOrchestrator {
    lanes: LaneSet,
    overlay: VariationOverlay,
    humanizer: Humanizer,
    gate: PatternGate,
    conditions: ConditionEvaluator,
    selector: NoteSelector,
    rng: RngStreams,
    params: ArpParams,
    last: BlendedStep,
}

impl StepOrchestrator {
    pub fn new(seeds: RngSeeds, params: ArpParams) -> Self {
        let params = params.sanitized(&ArpParams::default());
        Self {
            lanes: LaneSet::default(),
            overlay: VariationOverlay::new(),
            humanizer: Humanizer::new(),
            gate: PatternGate::default(),
            conditions: ConditionEvaluator::new(),
            selector: NoteSelector::new(params.note_order, params.octave_range),
            rng: RngStreams::new(seeds),
            params,
            last: BlendedStep::default(),
        }
    }

    pub fn lanes(&self) -> &LaneSet {
        &self.lanes
    }

    pub fn lanes_mut(&mut self) -> &mut LaneSet {
        &mut self.lanes
    }

    pub fn overlay(&self) -> &VariationOverlay {
        &self.overlay
    }

    pub fn set_spice(&mut self, amount: f32) {
        self.overlay.set_spice(amount);
    }

    /// Dice: refill the overlay from its own stream.
    pub fn regenerate_overlay(&mut self) {
        self.overlay.regenerate(&mut self.rng.dice);
    }

    pub fn humanize(&self) -> f32 {
        self.humanizer.amount()
    }

    pub fn set_humanize(&mut self, amount: f32) {
        self.humanizer.set_amount(amount);
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.conditions.set_fill(fill);
    }

    pub fn loop_count(&self) -> u32 {
        self.conditions.loop_count()
    }

    pub fn euclidean(&self) -> EuclideanConfig {
        self.gate.config()
    }

    pub fn set_euclidean(&mut self, config: EuclideanConfig) {
        self.gate.set_config(config);
    }

    pub fn params(&self) -> &ArpParams {
        &self.params
    }

    pub fn set_params(&mut self, params: ArpParams) {
        self.params = params.sanitized(&self.params);
        self.selector.set_order(self.params.note_order);
        self.selector.set_octave_range(self.params.octave_range);
    }

    /// The four random streams (read-only; tests compare draw counts).
    pub fn rng(&self) -> &RngStreams {
        &self.rng
    }

    /// Blended values of the most recently evaluated step.
    pub fn last_step(&self) -> BlendedStep {
        self.last
    }

    /// Transport restart. Random streams keep their positions.
    pub fn reset(&mut self) {
        self.lanes.reset();
        self.gate.reset();
        self.selector.reset();
        self.conditions.reset();
    }

    pub fn fire_step(
        &mut self,
        timing: &StepTiming,
        held: &HeldNotes,
        scheduler: &mut NoteScheduler,
        events: &mut Vec<EngineEvent>,
    ) -> StepOutcome {
        // Overlay slots must be read at the pre-advance positions
        let velocity_idx = self.lanes.velocity.current_index();
        let gate_idx = self.lanes.gate.current_index();
        let ratchet_idx = self.lanes.ratchet.current_index();
        let condition_idx = self.lanes.condition.current_index();

        let selection = self.selector.advance(held, &mut self.rng.selector);

        let velocity = self.lanes.velocity.advance();
        let gate = self.lanes.gate.advance();
        let pitch = self.lanes.pitch.advance();
        let modifier = self.lanes.modifier.advance();
        let ratchet = self.lanes.ratchet.advance();
        let condition = self.lanes.condition.advance();
        let following = self.lanes.modifier.peek();
        let euclidean_hit = self.gate.advance();

        let step = BlendedStep {
            velocity: self.overlay.blend_velocity(velocity, velocity_idx),
            gate: self.overlay.blend_gate(gate, gate_idx),
            pitch,
            modifier,
            ratchet: self.overlay.blend_ratchet(ratchet, ratchet_idx),
            condition: self.overlay.blend_condition(condition, condition_idx),
        };
        self.last = step;

        if !euclidean_hit {
            self.conditions.note_step(condition_idx == 0);
            return self.skip(timing, scheduler, StepOutcome::EuclideanRest);
        }

        self.conditions.note_step(condition_idx == 0);

        // Before the condition so its stream stays untouched when nothing is held
        if selection.is_empty() {
            return self.skip(timing, scheduler, StepOutcome::NoNote);
        }

        if !self.conditions.evaluate(step.condition, &mut self.rng.condition) {
            return self.skip(timing, scheduler, StepOutcome::ConditionFailed);
        }

        match step.modifier {
            StepModifier::Rest => return self.skip(timing, scheduler, StepOutcome::Rest),
            StepModifier::Tie if scheduler.has_held() => {
                let due = if following.is_legato() {
                    HELD
                } else {
                    timing.step_start
                        + gate_samples(timing.step_samples, self.params.gate_percent, step.gate) as u64
                };
                scheduler.extend_held(due);
                self.humanizer.discard(&mut self.rng.humanize);
                return StepOutcome::Tied;
            }
            StepModifier::Tie => {
                return self.skip(timing, scheduler, StepOutcome::TieWithoutPredecessor)
            }
            StepModifier::Normal | StepModifier::Slide | StepModifier::Accent => {}
        }

        let offsets = self.humanizer.offset(&mut self.rng.humanize, timing.sample_rate);

        let ratchets = step.ratchet.max(1);
        let sub_len = timing.step_samples / ratchets as f64;
        let gate_len = offsets.apply_gate(gate_samples(sub_len, self.params.gate_percent, step.gate));

        // Timing only moves the first sub-event
        let local = timing.step_start.saturating_sub(timing.block_start) as usize;
        let sample_offset = offsets.apply_timing(local, timing.block_size);
        let on_at = timing.block_start + sample_offset as u64;

        scheduler.release_held(on_at);
        let hold_last = following.is_legato();
        let is_tie = step.modifier == StepModifier::Slide;

        let mut voiced = 0u8;
        for note in selection.notes() {
            let pitch = (note.pitch as i16 + step.pitch as i16).clamp(0, 127) as u8;
            let scaled = scale_velocity(note.velocity, step.velocity);
            let accented = if step.modifier == StepModifier::Accent {
                scaled.saturating_add(self.params.accent_velocity).min(127)
            } else {
                scaled
            };
            let velocity = offsets.apply_velocity(accented);

            if !has_room_for_note(events.capacity() - events.len(), scheduler)
                || !scheduler.note_on(pitch, on_at, gate_len, hold_last && ratchets == 1)
            {
                continue;
            }
            push_event(
                events,
                EngineEvent::NoteOn(StepEvent {
                    sample_offset,
                    pitch,
                    velocity,
                    gate_samples: gate_len,
                    is_tie,
                }),
            );
            voiced += 1;

            for i in 1..ratchets {
                scheduler.push_on(PendingOn {
                    pitch,
                    velocity: scaled,
                    due: timing.step_start + (i as f64 * sub_len).round() as u64,
                    gate: gate_len,
                    hold: hold_last && i == ratchets - 1,
                });
            }
        }

        StepOutcome::Fired { notes: voiced, ratchets }
    }

    fn skip(&mut self, timing: &StepTiming, scheduler: &mut NoteScheduler, outcome: StepOutcome) -> StepOutcome {
        self.humanizer.discard(&mut self.rng.humanize);
        scheduler.release_held(timing.step_start);
        outcome
    }
}

/// `span * gate% * scale`, rounded, at least one sample.
pub fn gate_samples(span: f64, gate_percent: f32, scale: f32) -> u32 {
    let len = span * gate_percent as f64 / 100.0 * scale as f64;
    len.round().clamp(1.0, u32::MAX as f64) as u32
}

pub fn scale_velocity(velocity: u8, scale: f32) -> u8 {
    ((velocity as f32 * scale).round() as i32).clamp(1, 127) as u8
}

/// A note-on needs a slot for itself and one for its off, and every off
/// already pending must keep a slot too, so offs are never dropped.
#[inline]
pub(crate) fn has_room_for_note(free: usize, scheduler: &NoteScheduler) -> bool {
    free >= scheduler.pending_offs().len() + 2
}

/// Append without growing past the capacity reserved in `prepare`.
#[inline]
pub(crate) fn push_event(events: &mut Vec<EngineEvent>, event: EngineEvent) {
    if events.len() < events.capacity() {
        events.push(event);
    }
}
