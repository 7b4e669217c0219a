use serde::{Deserialize, Serialize};

/// The two generative blend amounts that are saved with a session.
///
/// Overlay contents and random-stream positions are never persisted; only
/// these two amounts survive a save/load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerativeAmounts {
    /// Spice: how much of the random overlay is blended in (0.0-1.0)
    pub spice: f32,
    /// Humanize: depth of per-step timing/velocity/gate jitter (0.0-1.0)
    pub humanize: f32,
}

impl GenerativeAmounts {
    pub fn new(spice: f32, humanize: f32) -> Self {
        Self {
            spice: sanitize_amount(spice, 0.0),
            humanize: sanitize_amount(humanize, 0.0),
        }
    }
}

/// Clamp an amount to [0,1]; non-finite input yields `last_good` instead.
pub fn sanitize_amount(value: f32, last_good: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        last_good
    }
}
