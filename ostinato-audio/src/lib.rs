//! # ostinato-audio
//!
//! The real-time half of ostinato. Everything reachable from
//! [`ArpEngine::process_block`] is allocation-free, lock-free and does not log;
//! control-thread writers talk to it through [`ControlHandle`].

pub mod condition;
pub mod control;
pub mod engine;
pub mod held_notes;
pub mod humanizer;
pub mod note_selector;
pub mod orchestrator;
pub mod overlay;
pub mod pattern_gate;
pub mod rng;
pub mod scheduler;

pub use condition::ConditionEvaluator;
pub use control::{control_pair, ControlCmd, ControlHandle, ControlReader};
pub use engine::ArpEngine;
pub use held_notes::HeldNotes;
pub use humanizer::{HumanizeOffsets, Humanizer};
pub use note_selector::{NoteSelector, Selection};
pub use orchestrator::{BlendedStep, StepOrchestrator, StepOutcome, StepTiming};
pub use overlay::VariationOverlay;
pub use pattern_gate::PatternGate;
pub use rng::{RngSeeds, RngStream, RngStreams};
pub use scheduler::NoteScheduler;
