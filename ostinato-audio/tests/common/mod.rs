#![allow(dead_code)]
//! Engine fixtures for ostinato-audio integration tests.

use ostinato_audio::{ArpEngine, RngSeeds};
use ostinato_types::{ArpParams, EngineEvent, LaneId, LaneValue, StepEvent, StepModifier, TrigCondition};

pub const SR: f64 = 48_000.0;
/// One sixteenth at 120 bpm, 48 kHz.
pub const STEP: usize = 6000;

/// Engine prepared for one-step blocks, holding `notes` at velocity 100.
pub fn engine_with_notes(notes: &[u8]) -> ArpEngine {
    let mut engine = ArpEngine::new(RngSeeds::default(), ArpParams::default());
    engine.prepare(SR, STEP);
    for &n in notes {
        engine.note_on(n, 100);
    }
    engine
}

/// Render `blocks` blocks, returning every event with its absolute sample position.
pub fn render(engine: &mut ArpEngine, blocks: usize, block_size: usize) -> Vec<(u64, EngineEvent)> {
    let mut out = Vec::new();
    for _ in 0..blocks {
        let start = engine.position();
        for ev in engine.process_block(block_size) {
            out.push((start + ev.sample_offset() as u64, *ev));
        }
    }
    out
}

/// Run exactly one step per block; returns each block's events.
pub fn render_steps(engine: &mut ArpEngine, steps: usize) -> Vec<Vec<EngineEvent>> {
    (0..steps).map(|_| engine.process_block(STEP).to_vec()).collect()
}

pub fn note_ons(events: &[(u64, EngineEvent)]) -> Vec<(u64, StepEvent)> {
    events
        .iter()
        .filter_map(|(at, ev)| ev.as_note_on().map(|on| (*at, *on)))
        .collect()
}

pub fn note_offs(events: &[(u64, EngineEvent)]) -> Vec<(u64, u8)> {
    events
        .iter()
        .filter_map(|(at, ev)| match ev {
            EngineEvent::NoteOff(off) => Some((*at, off.pitch)),
            EngineEvent::NoteOn(_) => None,
        })
        .collect()
}

/// Earliest note-on in a block, if any.
pub fn first_on(events: &[EngineEvent]) -> Option<StepEvent> {
    events
        .iter()
        .filter_map(|ev| ev.as_note_on().copied())
        .min_by_key(|on| on.sample_offset)
}

pub fn set_lane<T: Copy>(engine: &mut ArpEngine, lane: LaneId, values: &[T], wrap: fn(T) -> LaneValue) {
    engine.set_lane_length(lane, values.len());
    for (i, &v) in values.iter().enumerate() {
        engine.set_lane_value(i, wrap(v));
    }
}

/// A busy polymetric pattern touching every lane.
pub fn busy_pattern(engine: &mut ArpEngine) {
    set_lane(engine, LaneId::Velocity, &[1.0, 0.6, 0.8, 0.3, 0.9], LaneValue::Velocity);
    set_lane(engine, LaneId::Gate, &[1.0, 0.5, 1.5], LaneValue::Gate);
    set_lane(engine, LaneId::Pitch, &[0, 12, -5, 7, 0, 3], LaneValue::Pitch);
    set_lane(
        engine,
        LaneId::Modifier,
        &[
            StepModifier::Normal,
            StepModifier::Accent,
            StepModifier::Rest,
            StepModifier::Normal,
            StepModifier::Tie,
            StepModifier::Slide,
            StepModifier::Normal,
        ],
        LaneValue::Modifier,
    );
    set_lane(engine, LaneId::Ratchet, &[1, 2, 1, 4], LaneValue::Ratchet);
    set_lane(
        engine,
        LaneId::Condition,
        &[
            TrigCondition::Always,
            TrigCondition::Prob50,
            TrigCondition::Ratio1_2,
            TrigCondition::Always,
            TrigCondition::NotFill,
            TrigCondition::Prob75,
            TrigCondition::Always,
            TrigCondition::First,
        ],
        LaneValue::Condition,
    );
}
