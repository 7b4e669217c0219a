mod common;

use common::*;
use ostinato_audio::overlay::lerp;
use ostinato_types::{LaneId, LaneValue, MAX_LANE_STEPS};

#[test]
fn zero_spice_matches_baseline_at_several_tempos() {
    for bpm in [60.0, 97.5, 120.0, 174.0, 300.0] {
        let mut baseline = engine_with_notes(&[60, 64, 67]);
        let mut spiced = engine_with_notes(&[60, 64, 67]);
        for e in [&mut baseline, &mut spiced] {
            busy_pattern(e);
            e.set_tempo(bpm);
        }
        spiced.regenerate_overlay();
        spiced.set_spice(0.0);

        let mut steps = 0;
        while baseline.steps_evaluated() < 1000 {
            let a = baseline.process_block(512).to_vec();
            let b = spiced.process_block(512).to_vec();
            assert_eq!(a, b, "diverged at bpm {} after {} steps", bpm, steps);
            steps = baseline.steps_evaluated();
            if steps % 100 == 0 {
                spiced.regenerate_overlay();
            }
        }
        assert!(spiced.steps_evaluated() >= 1000);
    }
}

#[test]
fn full_spice_reads_the_overlay() {
    let mut engine = engine_with_notes(&[60]);
    for lane in [LaneId::Velocity, LaneId::Gate, LaneId::Ratchet, LaneId::Condition] {
        engine.set_lane_length(lane, MAX_LANE_STEPS);
    }
    engine.regenerate_overlay();
    engine.set_spice(1.0);

    for step in 0..(3 * MAX_LANE_STEPS) {
        engine.process_block(STEP);
        let idx = step % MAX_LANE_STEPS;
        let blended = engine.last_step();
        let overlay = engine.overlay();
        assert_eq!(blended.velocity.to_bits(), overlay.velocity(idx).to_bits());
        assert_eq!(blended.gate.to_bits(), overlay.gate(idx).to_bits());
        assert_eq!(blended.ratchet, overlay.ratchet(idx));
        assert_eq!(blended.condition, overlay.condition(idx));
    }
}

#[test]
fn blend_follows_linear_law_per_lane_index() {
    let mut engine = engine_with_notes(&[60]);
    // Different lengths: every lane reads its own overlay slot
    let velocities = [0.2f32, 0.9, 0.5];
    let gates = [1.8f32, 0.4, 1.0, 0.7, 1.2];
    let ratchets = [1u8, 4, 2, 3, 1, 2, 4];
    set_lane(&mut engine, LaneId::Velocity, &velocities, LaneValue::Velocity);
    set_lane(&mut engine, LaneId::Gate, &gates, LaneValue::Gate);
    set_lane(&mut engine, LaneId::Ratchet, &ratchets, LaneValue::Ratchet);
    engine.regenerate_overlay();

    for &t in &[0.1f32, 0.3, 0.5, 0.77, 0.95] {
        engine.set_spice(t);
        engine.reset();
        for step in 0..40 {
            engine.process_block(STEP);
            let blended = engine.last_step();
            let overlay = engine.overlay();

            let (vi, gi, ri) = (step % 3, step % 5, step % 7);
            let a = velocities[vi];
            let b = overlay.velocity(vi);
            assert!((blended.velocity - (a + (b - a) * t)).abs() < 1e-3);
            let a = gates[gi];
            let b = overlay.gate(gi);
            assert!((blended.gate - (a + (b - a) * t)).abs() < 1e-3);
            let expected = lerp(ratchets[ri] as f32, overlay.ratchet(ri) as f32, t).round() as u8;
            assert_eq!(blended.ratchet, expected.clamp(1, 4));
        }
    }
}

#[test]
fn half_spice_worked_example() {
    let mut engine = engine_with_notes(&[60]);
    engine.regenerate_overlay();
    engine.set_spice(0.5);
    // Velocity lane at 1.0; the blend is halfway to the overlay slot
    engine.process_block(STEP);
    let expected = 1.0 + (engine.overlay().velocity(0) - 1.0) * 0.5;
    assert!((engine.last_step().velocity - expected).abs() < 1e-3);
}

#[test]
fn dice_only_consumes_on_request() {
    let mut engine = engine_with_notes(&[60, 64]);
    engine.set_spice(1.0);
    engine.set_humanize(1.0);
    render_steps(&mut engine, 200);
    assert_eq!(engine.rng().dice.draws(), 0);
    engine.regenerate_overlay();
    render_steps(&mut engine, 200);
    assert_eq!(engine.rng().dice.draws(), 128);
}

#[test]
fn spice_and_humanize_compose_on_velocity() {
    let build = |spice: f32, humanize: f32| {
        let mut engine = engine_with_notes(&[60]);
        engine.set_lane_length(LaneId::Velocity, 8);
        engine.regenerate_overlay();
        engine.set_spice(spice);
        engine.set_humanize(humanize);
        engine
    };
    // Below half spice the condition lane stays Always, so every step fires
    let mut both = build(0.4, 1.0);
    let mut spiced = build(0.4, 0.0);
    let mut humanized = build(0.0, 1.0);

    let mut differs_from_each = 0;
    for _ in 0..200 {
        let b = first_on(&both.process_block(STEP).to_vec());
        let s = first_on(&spiced.process_block(STEP).to_vec());
        let h = first_on(&humanized.process_block(STEP).to_vec());
        let (b, s, h) = (b.unwrap(), s.unwrap(), h.unwrap());
        // Humanize alone never clamps around 100, so its offset is exact
        let offset = h.velocity as i32 - 100;
        assert_eq!(b.velocity as i32, (s.velocity as i32 + offset).clamp(1, 127));
        if b.velocity != s.velocity && b.velocity != h.velocity {
            differs_from_each += 1;
        }
    }
    assert!(differs_from_each > 50, "only {} composed steps", differs_from_each);
}
