//! Euclidean rhythm gate.
//!
//! Places `hits` pulses as evenly as possible over `steps` positions using
//! Bresenham-style error accumulation. The pattern is cached as a bitmask so
//! the per-step query is a shift and a mask.

use ostinato_types::EuclideanConfig;

#[derive(Debug, Clone)]
pub struct PatternGate {
    config: EuclideanConfig,
    mask: u32,
    position: usize,
}

impl Default for PatternGate {
    fn default() -> Self {
        Self::new(EuclideanConfig::default())
    }
}

impl PatternGate {
    pub fn new(config: EuclideanConfig) -> Self {
        let config = config.clamped();
        Self {
            config,
            mask: euclidean_mask(config.hits, config.steps, config.rotation),
            position: 0,
        }
    }

    pub fn config(&self) -> EuclideanConfig {
        self.config
    }

    pub fn set_config(&mut self, config: EuclideanConfig) {
        let config = config.clamped();
        self.config = config;
        self.mask = euclidean_mask(config.hits, config.steps, config.rotation);
        self.position %= config.steps as usize;
    }

    /// Hit/rest for an absolute step index. Always a hit when the gate is disabled.
    #[inline]
    pub fn is_hit(&self, step: usize) -> bool {
        if !self.config.enabled {
            return true;
        }
        let idx = step % self.config.steps as usize;
        self.mask & (1 << idx) != 0
    }

    /// Evaluate the gate's own step counter, then move it forward.
    #[inline]
    pub fn advance(&mut self) -> bool {
        let hit = self.is_hit(self.position);
        self.position = (self.position + 1) % self.config.steps as usize;
        hit
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

/// Bit `i` set when step `i` is a hit. Rotation shifts the pattern right.
pub fn euclidean_mask(hits: u8, steps: u8, rotation: u8) -> u32 {
    let steps = steps.clamp(1, 32) as u32;
    let hits = (hits as u32).min(steps);
    let rotation = rotation as u32 % steps;
    let mut mask = 0u32;
    for i in 0..steps {
        if (i * hits) % steps < hits {
            let rotated = (i + rotation) % steps;
            mask |= 1 << rotated;
        }
    }
    mask
}
