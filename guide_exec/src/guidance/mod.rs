//! # Differential guidance module
//!
//! Guidance turns the rover's current pose and the active mission leg into a normalised throttle
//! and a yaw rate demand for a differential drive (skid steer) rover. It is made up of:
//!
//! - The waypoint store, which keeps the rover position and the mission waypoints in a single
//!   local north-east frame, re-anchoring that frame when the upstream reference moves.
//! - The mode machine, which decides between spot turning, driving and stopping.
//! - The heading and speed controllers, which produce the command for the active mode.
//!
//! While driving the yaw rate comes straight from the path tracker and is flagged as closed loop.
//! While spot turning it comes from a PI controller on the heading error and the speed target is
//! zero. While stopped the command is exactly zero.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod ctrl;
pub mod mode;
pub mod params;
mod state;
mod waypoints;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::{GuidanceParams, ParamsError};
pub use state::*;
pub use waypoints::{Targets, UpstreamSamples, WaypointStore};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while setting up guidance.
#[derive(Debug, thiserror::Error)]
pub enum GuidanceError {
    #[error("Failed to load GuidanceParams: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid GuidanceParams: {0}")]
    InvalidParams(ParamsError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Load and validate guidance parameters from a TOML file.
pub fn load_params(path: impl AsRef<std::path::Path>) -> Result<GuidanceParams, GuidanceError> {
    let params: GuidanceParams = util::params::load(path)
        .map_err(GuidanceError::ParamLoadError)?;

    params.validate().map_err(GuidanceError::InvalidParams)?;

    Ok(params)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: GuidanceParams = util::params::from_str(
            include_str!("../../../params/guidance.toml")
        ).unwrap();

        assert_eq!(params.validate(), Ok(()));

        // Same as the defaults, within float parsing
        let mut expected = GuidanceParams::default();
        assert!((params.trans_turn_drive_rad - expected.trans_turn_drive_rad).abs() < 1e-6);
        assert!((params.trans_drive_turn_rad - expected.trans_drive_turn_rad).abs() < 1e-6);
        expected.trans_turn_drive_rad = params.trans_turn_drive_rad;
        expected.trans_drive_turn_rad = params.trans_drive_turn_rad;
        assert_eq!(params, expected);
    }

    #[test]
    fn test_load_params_errors() {
        assert!(matches!(
            load_params("/no/such/dir/guidance.toml"),
            Err(GuidanceError::ParamLoadError(_))
        ));
    }
}
