//! # ostinato-types
//!
//! Shared type definitions for the ostinato step-sequencing engine: lanes,
//! step enums, arpeggiator parameters and the events a processed block yields.
//! Nothing in this crate allocates on the hot path.

pub mod arpeggiator;
pub mod event;
pub mod generative;
pub mod lane;
pub mod step;

pub use arpeggiator::{ArpParams, ArpRate, EuclideanConfig, HeldNote, NoteOrder};
pub use event::{EngineEvent, PendingNoteOff, StepEvent};
pub use generative::{sanitize_amount, GenerativeAmounts};
pub use lane::{Lane, LaneId, LaneSet, LaneValue, MAX_LANE_STEPS};
pub use step::{ConditionClass, StepModifier, TrigCondition};
