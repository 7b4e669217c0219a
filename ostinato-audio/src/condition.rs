//! Trigger-condition evaluation against the loop counter.

use ostinato_types::{ConditionClass, TrigCondition};

use crate::rng::RngStream;

#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    /// Completed passes through the condition lane
    loop_count: u32,
    fill: bool,
    started: bool,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn fill(&self) -> bool {
        self.fill
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.fill = fill;
    }

    /// Loop-wrap bookkeeping; call once per evaluated step with whether the
    /// condition lane is back at its first slot. The very first cycle after a
    /// reset is loop 0.
    #[inline]
    pub fn note_step(&mut self, cycle_start: bool) {
        if !cycle_start {
            return;
        }
        if self.started {
            self.loop_count = self.loop_count.wrapping_add(1);
        } else {
            self.started = true;
        }
    }

    /// Does a step carrying `condition` fire? Only probability conditions draw from `rng`.
    #[inline]
    pub fn evaluate(&self, condition: TrigCondition, rng: &mut RngStream) -> bool {
        match condition.class() {
            ConditionClass::Always => true,
            ConditionClass::Probability(p) => rng.next_unit() < p,
            ConditionClass::Ratio { a, b } => self.loop_count % b == a - 1,
            ConditionClass::First => self.loop_count == 0,
            ConditionClass::Fill => self.fill,
            ConditionClass::NotFill => !self.fill,
        }
    }

    pub fn reset(&mut self) {
        self.loop_count = 0;
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_never_draws() {
        let eval = ConditionEvaluator::new();
        let mut rng = RngStream::new(1);
        for _ in 0..10 {
            assert!(eval.evaluate(TrigCondition::Always, &mut rng));
        }
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn probability_draws_once_and_matches_rate() {
        let eval = ConditionEvaluator::new();
        let mut rng = RngStream::new(99);
        let fired = (0..10_000)
            .filter(|_| eval.evaluate(TrigCondition::Prob25, &mut rng))
            .count();
        assert_eq!(rng.draws(), 10_000);
        assert!((2_200..2_800).contains(&fired), "fired {}", fired);
    }

    #[test]
    fn ratio_follows_loop_counter() {
        let mut eval = ConditionEvaluator::new();
        let mut rng = RngStream::new(1);
        let mut pattern = Vec::new();
        for _ in 0..8 {
            eval.note_step(true);
            pattern.push(eval.evaluate(TrigCondition::Ratio2_4, &mut rng));
        }
        assert_eq!(pattern, vec![false, true, false, false, false, true, false, false]);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn first_only_on_loop_zero() {
        let mut eval = ConditionEvaluator::new();
        let mut rng = RngStream::new(1);
        eval.note_step(true);
        assert!(eval.evaluate(TrigCondition::First, &mut rng));
        eval.note_step(false);
        assert!(eval.evaluate(TrigCondition::First, &mut rng));
        eval.note_step(true);
        assert!(!eval.evaluate(TrigCondition::First, &mut rng));
        assert_eq!(eval.loop_count(), 1);
        eval.reset();
        eval.note_step(true);
        assert!(eval.evaluate(TrigCondition::First, &mut rng));
    }

    #[test]
    fn fill_and_not_fill() {
        let mut eval = ConditionEvaluator::new();
        let mut rng = RngStream::new(1);
        assert!(!eval.evaluate(TrigCondition::Fill, &mut rng));
        assert!(eval.evaluate(TrigCondition::NotFill, &mut rng));
        eval.set_fill(true);
        assert!(eval.evaluate(TrigCondition::Fill, &mut rng));
        assert!(!eval.evaluate(TrigCondition::NotFill, &mut rng));
    }
}
