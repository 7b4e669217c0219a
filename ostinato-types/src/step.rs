//! Per-step discrete values: step modifiers and trigger conditions.

use serde::{Deserialize, Serialize};

/// What a step does once it has passed the rhythm gate and its trigger condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StepModifier {
    /// Plain note
    #[default]
    Normal,
    /// Silent step
    Rest,
    /// Sustain the previous note through this step instead of re-triggering
    Tie,
    /// Legato into this note from the previous one
    Slide,
    /// Note with added velocity
    Accent,
}

impl StepModifier {
    /// True when the note before this step should stay open until this step decides.
    pub fn is_legato(&self) -> bool {
        matches!(self, StepModifier::Tie | StepModifier::Slide)
    }
}

/// Per-step trigger condition, evaluated against the running loop counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TrigCondition {
    #[default]
    Always,
    Prob10,
    Prob25,
    Prob50,
    Prob75,
    Prob90,
    Ratio1_2,
    Ratio2_2,
    Ratio1_3,
    Ratio2_3,
    Ratio3_3,
    Ratio1_4,
    Ratio2_4,
    Ratio3_4,
    Ratio4_4,
    /// Only on the first pass through the condition lane
    First,
    /// Only while fill is engaged
    Fill,
    /// Only while fill is not engaged
    NotFill,
}

/// How a condition decides, grouped so the evaluator can match once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionClass {
    Always,
    Probability(f32),
    /// Fires on loop `a` (1-based) of every `b` loops
    Ratio { a: u32, b: u32 },
    First,
    Fill,
    NotFill,
}

impl TrigCondition {
    pub const ALL: [TrigCondition; 18] = [
        TrigCondition::Always,
        TrigCondition::Prob10,
        TrigCondition::Prob25,
        TrigCondition::Prob50,
        TrigCondition::Prob75,
        TrigCondition::Prob90,
        TrigCondition::Ratio1_2,
        TrigCondition::Ratio2_2,
        TrigCondition::Ratio1_3,
        TrigCondition::Ratio2_3,
        TrigCondition::Ratio3_3,
        TrigCondition::Ratio1_4,
        TrigCondition::Ratio2_4,
        TrigCondition::Ratio3_4,
        TrigCondition::Ratio4_4,
        TrigCondition::First,
        TrigCondition::Fill,
        TrigCondition::NotFill,
    ];

    /// Look up a condition by its position in [`TrigCondition::ALL`], wrapping.
    pub fn from_index(index: usize) -> TrigCondition {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn class(&self) -> ConditionClass {
        match self {
            TrigCondition::Always => ConditionClass::Always,
            TrigCondition::Prob10 => ConditionClass::Probability(0.10),
            TrigCondition::Prob25 => ConditionClass::Probability(0.25),
            TrigCondition::Prob50 => ConditionClass::Probability(0.50),
            TrigCondition::Prob75 => ConditionClass::Probability(0.75),
            TrigCondition::Prob90 => ConditionClass::Probability(0.90),
            TrigCondition::Ratio1_2 => ConditionClass::Ratio { a: 1, b: 2 },
            TrigCondition::Ratio2_2 => ConditionClass::Ratio { a: 2, b: 2 },
            TrigCondition::Ratio1_3 => ConditionClass::Ratio { a: 1, b: 3 },
            TrigCondition::Ratio2_3 => ConditionClass::Ratio { a: 2, b: 3 },
            TrigCondition::Ratio3_3 => ConditionClass::Ratio { a: 3, b: 3 },
            TrigCondition::Ratio1_4 => ConditionClass::Ratio { a: 1, b: 4 },
            TrigCondition::Ratio2_4 => ConditionClass::Ratio { a: 2, b: 4 },
            TrigCondition::Ratio3_4 => ConditionClass::Ratio { a: 3, b: 4 },
            TrigCondition::Ratio4_4 => ConditionClass::Ratio { a: 4, b: 4 },
            TrigCondition::First => ConditionClass::First,
            TrigCondition::Fill => ConditionClass::Fill,
            TrigCondition::NotFill => ConditionClass::NotFill,
        }
    }

    /// Position in [`TrigCondition::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}
