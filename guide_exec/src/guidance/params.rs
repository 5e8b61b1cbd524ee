//! Differential guidance parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::tm::GuidanceMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use crate::pursuit::PursuitParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for differential guidance
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct GuidanceParams {

    /// Heading controller proportional gain
    pub heading_k_p: f32,

    /// Heading controller integral gain
    pub heading_k_i: f32,

    /// Speed controller proportional gain
    pub speed_k_p: f32,

    /// Speed controller integral gain
    pub speed_k_i: f32,

    /// Maximum speed of the rover, also the speed at which the throttle feed-forward saturates.
    pub max_speed_ms: f32,

    /// Maximum acceleration of the speed setpoint. Zero disables the limit.
    pub max_accel_mss: f32,

    /// Maximum jerk of the speed setpoint. Zero disables the limit.
    pub max_jerk_msss: f32,

    /// Maximum yaw rate demand
    pub max_yaw_rate_rads: f32,

    /// Speed used when the mission doesn't request one
    pub miss_speed_default_ms: f32,

    /// Radius around a waypoint within which it is considered reached
    pub nav_acc_rad_m: f32,

    /// Heading error under which a spot turn is complete and driving resumes
    pub trans_turn_drive_rad: f32,

    /// Heading error over which driving stops and a spot turn begins
    pub trans_drive_turn_rad: f32,

    /// Speed under which a spot turn may begin
    pub turn_max_speed_ms: f32,

    /// Distance the upstream local frame origin may move before the projection is re-anchored
    pub anchor_tolerance_m: f32,

    /// Mode guidance starts in
    pub initial_mode: GuidanceMode,

    /// Path tracker parameters
    pub pursuit: PursuitParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a parameter set is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Parameter {0} is not finite")]
    NotFinite(&'static str),

    #[error("Parameter {0} must not be negative, found {1}")]
    Negative(&'static str, f32),

    #[error("Parameter {0} must be greater than zero, found {1}")]
    NotPositive(&'static str, f32),

    #[error(
        "The turn to drive threshold ({0} rad) must be smaller than the drive to turn \
        threshold ({1} rad)"
    )]
    NoHysteresis(f32, f32),

    #[error("The drive to turn threshold ({0} rad) must not exceed pi")]
    TurnThresholdTooLarge(f32),

    #[error("Minimum lookahead ({0} m) is larger than the maximum lookahead ({1} m)")]
    LookaheadRange(f32, f32),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GuidanceParams {
    fn default() -> Self {
        Self {
            heading_k_p: 1.0,
            heading_k_i: 0.1,
            speed_k_p: 0.5,
            speed_k_i: 0.1,
            max_speed_ms: 2.0,
            max_accel_mss: 0.5,
            max_jerk_msss: 0.5,
            max_yaw_rate_rads: 1.5,
            miss_speed_default_ms: 1.0,
            nav_acc_rad_m: 2.0,
            trans_turn_drive_rad: 0.0872665,
            trans_drive_turn_rad: 0.174533,
            turn_max_speed_ms: 0.2,
            anchor_tolerance_m: 0.5,
            initial_mode: GuidanceMode::Driving,
            pursuit: PursuitParams::default(),
        }
    }
}

impl GuidanceParams {
    /// Check the parameters are usable by guidance.
    ///
    /// Out of range values are rejected here rather than inside the control law, so a validated
    /// parameter set can be used without further checks.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let non_negative = [
            ("heading_k_p", self.heading_k_p),
            ("heading_k_i", self.heading_k_i),
            ("speed_k_p", self.speed_k_p),
            ("speed_k_i", self.speed_k_i),
            ("max_accel_mss", self.max_accel_mss),
            ("max_jerk_msss", self.max_jerk_msss),
            ("miss_speed_default_ms", self.miss_speed_default_ms),
            ("turn_max_speed_ms", self.turn_max_speed_ms),
            ("anchor_tolerance_m", self.anchor_tolerance_m),
            ("pursuit.lookahead_gain", self.pursuit.lookahead_gain),
        ];
        let positive = [
            ("max_speed_ms", self.max_speed_ms),
            ("max_yaw_rate_rads", self.max_yaw_rate_rads),
            ("nav_acc_rad_m", self.nav_acc_rad_m),
            ("trans_turn_drive_rad", self.trans_turn_drive_rad),
            ("trans_drive_turn_rad", self.trans_drive_turn_rad),
            ("pursuit.lookahead_min_m", self.pursuit.lookahead_min_m),
            ("pursuit.lookahead_max_m", self.pursuit.lookahead_max_m),
        ];

        for &(name, value) in non_negative.iter().chain(positive.iter()) {
            if !value.is_finite() {
                return Err(ParamsError::NotFinite(name))
            }
        }

        for &(name, value) in non_negative.iter() {
            if value < 0.0 {
                return Err(ParamsError::Negative(name, value))
            }
        }

        for &(name, value) in positive.iter() {
            if value <= 0.0 {
                return Err(ParamsError::NotPositive(name, value))
            }
        }

        if self.trans_turn_drive_rad >= self.trans_drive_turn_rad {
            return Err(ParamsError::NoHysteresis(
                self.trans_turn_drive_rad,
                self.trans_drive_turn_rad
            ))
        }

        if self.trans_drive_turn_rad > std::f32::consts::PI {
            return Err(ParamsError::TurnThresholdTooLarge(self.trans_drive_turn_rad))
        }

        if self.pursuit.lookahead_min_m > self.pursuit.lookahead_max_m {
            return Err(ParamsError::LookaheadRange(
                self.pursuit.lookahead_min_m,
                self.pursuit.lookahead_max_m
            ))
        }

        Ok(())
    }
}
