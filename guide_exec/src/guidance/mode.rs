//! # Guidance mode machine
//!
//! Guidance is always in exactly one of three modes:
//!
//! - `SpotTurning` - the rover rotates in place until it faces the path tracker's desired
//!   heading.
//! - `Driving` - the rover drives forwards, steered by the path tracker.
//! - `Stopped` - the rover is held still.
//!
//! Transitions between turning and driving use two thresholds on the heading error so the mode
//! does not chatter when the error sits near a single boundary. A spot turn only begins once the
//! rover is slow enough to pivot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{nav::NavState, tm::GuidanceMode};

use super::{ctrl::PiController, GuidanceParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Inputs to the mode transition function for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct ModeInputs {
    /// Wrapped heading error to the desired heading
    pub heading_error_rad: f32,

    /// Current forward speed of the rover
    pub speed_ms: f32,

    /// Set if any of the stop conditions hold this cycle
    pub stop: Option<StopReason>,
}

/// Data held while in the spot turning mode.
#[derive(Debug, Clone, Default)]
pub struct SpotTurn {
    /// Heading controller, created fresh on entry so the integral starts from zero
    pub heading_ctrl: PiController,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The active mode along with any data which only lives as long as that mode.
#[derive(Debug, Clone)]
pub enum GuidanceState {
    SpotTurning(SpotTurn),
    Driving,
    Stopped,
}

/// Reasons guidance holds the rover still.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The navigation state does not ask guidance to move the rover
    NavInactive,

    /// The mission layer reports the mission complete
    MissionFinished,

    /// The final waypoint is within the acceptance radius
    FinalWaypointReached,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GuidanceState {
    /// Enter the given mode, performing its entry actions.
    pub fn enter(mode: GuidanceMode, params: &GuidanceParams) -> Self {
        match mode {
            GuidanceMode::SpotTurning => GuidanceState::SpotTurning(SpotTurn {
                heading_ctrl: PiController::new(
                    params.heading_k_p,
                    params.heading_k_i,
                    1.0,
                    params.max_yaw_rate_rads
                )
            }),
            GuidanceMode::Driving => GuidanceState::Driving,
            GuidanceMode::Stopped => GuidanceState::Stopped,
        }
    }

    pub fn mode(&self) -> GuidanceMode {
        match self {
            GuidanceState::SpotTurning(_) => GuidanceMode::SpotTurning,
            GuidanceState::Driving => GuidanceMode::Driving,
            GuidanceState::Stopped => GuidanceMode::Stopped,
        }
    }

    /// Integral of the heading controller, zero outside a spot turn.
    pub fn heading_integral(&self) -> f32 {
        match self {
            GuidanceState::SpotTurning(s) => s.heading_ctrl.integral(),
            _ => 0.0
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::NavInactive => write!(f, "navigation inactive"),
            StopReason::MissionFinished => write!(f, "mission finished"),
            StopReason::FinalWaypointReached => write!(f, "final waypoint reached"),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Determine whether the rover must be held still this cycle.
pub fn stop_reason(
    nav_state: NavState,
    mission_finished: bool,
    is_final_wp: bool,
    distance_to_wp_m: f32,
    params: &GuidanceParams
) -> Option<StopReason> {
    if !nav_state.is_active_navigation() {
        Some(StopReason::NavInactive)
    }
    else if mission_finished {
        Some(StopReason::MissionFinished)
    }
    else if is_final_wp && distance_to_wp_m <= params.nav_acc_rad_m {
        Some(StopReason::FinalWaypointReached)
    }
    else {
        None
    }
}

/// Compute the mode for this cycle from the mode of the last cycle.
///
/// A non-finite heading error or speed never triggers a turn/drive transition.
pub fn next_mode(
    current: GuidanceMode,
    inputs: &ModeInputs,
    params: &GuidanceParams
) -> GuidanceMode {
    if inputs.stop.is_some() {
        return GuidanceMode::Stopped
    }

    let abs_err = inputs.heading_error_rad.abs();

    match current {
        GuidanceMode::Stopped => GuidanceMode::Driving,
        GuidanceMode::Driving => {
            if abs_err > params.trans_drive_turn_rad
                && inputs.speed_ms < params.turn_max_speed_ms
            {
                GuidanceMode::SpotTurning
            }
            else {
                GuidanceMode::Driving
            }
        },
        GuidanceMode::SpotTurning => {
            if abs_err < params.trans_turn_drive_rad {
                GuidanceMode::Driving
            }
            else {
                GuidanceMode::SpotTurning
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
