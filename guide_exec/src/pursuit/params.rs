//! Pure pursuit parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pure pursuit path tracker
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct PursuitParams {
    /// Lookahead distance per unit of speed, in seconds
    pub lookahead_gain: f32,

    /// Minimum lookahead distance
    pub lookahead_min_m: f32,

    /// Maximum lookahead distance
    pub lookahead_max_m: f32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PursuitParams {
    fn default() -> Self {
        Self {
            lookahead_gain: 1.0,
            lookahead_min_m: 1.0,
            lookahead_max_m: 10.0,
        }
    }
}

impl PursuitParams {
    /// Lookahead distance for the given speed, bounded by the configured limits.
    pub fn lookahead_m(&self, speed_ms: f32) -> f32 {
        (self.lookahead_gain * speed_ms.max(0.0))
            .max(self.lookahead_min_m)
            .min(self.lookahead_max_m)
    }
}
