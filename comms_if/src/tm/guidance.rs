//! # Differential guidance outputs

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command sent from guidance to the actuator mixing layer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffSetpoint {
    /// Normalised throttle in the range [-1, 1]
    pub throttle: f32,

    /// Yaw rate demand in radians/second, positive clockwise seen from above
    pub yaw_rate_rads: f32,

    /// True if the yaw rate was produced by the path tracker and must not be passed through
    /// further heading feedback downstream.
    pub closed_loop_yaw_rate: bool,
}

/// Status record published by guidance once per cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidanceStatus {
    /// Guidance time in seconds, the sum of all cycle time steps
    pub time_s: f64,

    /// Active guidance mode after this cycle's transition
    pub mode: GuidanceMode,

    /// Target speed before slew limiting
    pub desired_speed_ms: f32,

    /// Slew limited speed setpoint given to the speed controller
    pub speed_setpoint_ms: f32,

    /// Integral state of the speed controller
    pub pid_throttle_integral: f32,

    /// Integral state of the spot turn heading controller
    pub pid_heading_integral: f32,

    /// Heading error to the path tracker's desired heading in degrees
    pub heading_error_deg: f32,

    /// Lookahead distance used by the path tracker
    pub lookahead_distance_m: f32,

    /// Distance to the current waypoint
    pub distance_to_wp_m: f32,

    /// True if this cycle's inputs were unusable and a zero command was emitted
    pub degraded: bool,

    /// The command emitted this cycle
    pub setpoint: DiffSetpoint,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Guidance mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuidanceMode {
    /// Rotating in place towards the desired heading
    SpotTurning,

    /// Driving forwards along the path
    Driving,

    /// Holding still
    Stopped,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DiffSetpoint {
    /// The zero command: no throttle, no yaw rate.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns true if every field of the command is finite.
    pub fn is_finite(&self) -> bool {
        self.throttle.is_finite() && self.yaw_rate_rads.is_finite()
    }
}

impl Default for GuidanceMode {
    fn default() -> Self {
        GuidanceMode::Driving
    }
}

impl std::fmt::Display for GuidanceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidanceMode::SpotTurning => write!(f, "GuidanceMode::SpotTurning"),
            GuidanceMode::Driving => write!(f, "GuidanceMode::Driving"),
            GuidanceMode::Stopped => write!(f, "GuidanceMode::Stopped"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_json() {
        let status = GuidanceStatus {
            mode: GuidanceMode::SpotTurning,
            setpoint: DiffSetpoint {
                throttle: 0.0,
                yaw_rate_rads: 1.0,
                closed_loop_yaw_rate: false,
            },
            ..Default::default()
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"mode\":\"SpotTurning\""));

        let back: GuidanceStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
