//! Mission and setpoint samples

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single position setpoint (waypoint).
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSetpoint {
    /// True if this setpoint is in use
    pub valid: bool,

    pub lat_deg: f64,
    pub lon_deg: f64,

    /// Requested speed towards this setpoint in meters/second, if any
    pub cruising_speed_ms: Option<f32>,
}

/// The previous, current and next waypoints of the active mission leg.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSetpointTriplet {
    pub timestamp_us: u64,

    pub previous: PositionSetpoint,
    pub current: PositionSetpoint,
    pub next: PositionSetpoint,
}

/// Progress of the mission.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionResult {
    pub timestamp_us: u64,

    /// True if the mission is valid
    pub valid: bool,

    /// Index of the current mission item
    pub seq_current: u16,

    /// Total number of mission items
    pub seq_total: u16,

    /// True if the mission has been completed
    pub finished: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The navigation state commanded by the mission layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavState {
    /// Direct control by an operator, guidance is not in the loop
    Manual,

    /// Hold the current position
    Hold,

    /// Mission paused by the operator
    Paused,

    /// Executing the waypoint mission
    Mission,

    /// Returning to the home position
    ReturnToLaunch,

    /// Waypoints supplied by an external computer
    Offboard,

    /// Vehicle is disarmed
    Disarmed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PositionSetpoint {
    /// Create a valid setpoint at the given coordinates.
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            valid: true,
            lat_deg,
            lon_deg,
            cruising_speed_ms: None,
        }
    }
}

impl NavState {
    /// Returns true if the navigation state asks guidance to move the vehicle.
    pub fn is_active_navigation(&self) -> bool {
        matches!(
            self,
            NavState::Mission | NavState::ReturnToLaunch | NavState::Offboard
        )
    }
}

impl Default for NavState {
    fn default() -> Self {
        NavState::Disarmed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_active_navigation() {
        assert!(NavState::Mission.is_active_navigation());
        assert!(NavState::ReturnToLaunch.is_active_navigation());
        assert!(NavState::Offboard.is_active_navigation());
        assert!(!NavState::Hold.is_active_navigation());
        assert!(!NavState::Paused.is_active_navigation());
        assert!(!NavState::Manual.is_active_navigation());
        assert!(!NavState::default().is_active_navigation());
    }

    #[test]
    fn test_triplet_json() {
        let json = r#"{
            "timestamp_us": 5,
            "previous": { "valid": false, "lat_deg": 0.0, "lon_deg": 0.0, "cruising_speed_ms": null },
            "current": { "valid": true, "lat_deg": 47.1, "lon_deg": 8.2, "cruising_speed_ms": 1.5 },
            "next": { "valid": false, "lat_deg": 0.0, "lon_deg": 0.0, "cruising_speed_ms": null }
        }"#;

        let triplet: PositionSetpointTriplet = serde_json::from_str(json).unwrap();
        assert!(triplet.current.valid);
        assert_eq!(triplet.current.cruising_speed_ms, Some(1.5));
        assert!(!triplet.previous.valid);
    }
}
