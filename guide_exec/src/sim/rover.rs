//! Kinematic skid steer rover model

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tm::DiffSetpoint;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated rover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoverParams {
    /// Speed reached at full throttle
    pub max_speed_ms: f32,

    /// Time constant of the speed response to throttle
    pub speed_time_const_s: f32,

    /// Time constant of the yaw rate response to the demand
    pub yaw_rate_time_const_s: f32,
}

/// Simulated rover state in the local north-east frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimRover {
    pub pos_m: Vector2<f32>,
    pub heading_rad: f32,
    pub speed_ms: f32,
    pub yaw_rate_rads: f32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RoverParams {
    fn default() -> Self {
        Self {
            max_speed_ms: 2.0,
            speed_time_const_s: 0.5,
            yaw_rate_time_const_s: 0.2,
        }
    }
}

impl SimRover {
    pub fn new(pos_m: Vector2<f32>, heading_rad: f32) -> Self {
        Self {
            pos_m,
            heading_rad: wrap_pi(heading_rad),
            ..Default::default()
        }
    }

    /// Step the rover forward by `dt_s` seconds under the given command.
    ///
    /// Speed and yaw rate follow their demands with a first order lag, the pose is then
    /// integrated as a unicycle.
    pub fn step(&mut self, cmd: &DiffSetpoint, params: &RoverParams, dt_s: f32) {
        if !cmd.is_finite() || !dt_s.is_finite() || dt_s <= 0.0 {
            return
        }

        let speed_dem = cmd.throttle.max(-1.0).min(1.0) * params.max_speed_ms;

        self.speed_ms += lag_gain(params.speed_time_const_s, dt_s) * (speed_dem - self.speed_ms);
        self.yaw_rate_rads += lag_gain(params.yaw_rate_time_const_s, dt_s)
            * (cmd.yaw_rate_rads - self.yaw_rate_rads);

        self.heading_rad = wrap_pi(self.heading_rad + self.yaw_rate_rads * dt_s);
        self.pos_m += Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
            * self.speed_ms
            * dt_s;
    }

    /// Velocity in the north-east frame.
    pub fn velocity_ms(&self) -> Vector2<f32> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin()) * self.speed_ms
    }
}

/// Fraction of the remaining error removed in one step of a first order lag.
fn lag_gain(time_const_s: f32, dt_s: f32) -> f32 {
    if time_const_s <= 0.0 {
        1.0
    }
    else {
        1.0 - (-dt_s / time_const_s).exp()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_drive_straight() {
        let params = RoverParams {
            speed_time_const_s: 0.0,
            ..Default::default()
        };
        let mut rover = SimRover::new(Vector2::zeros(), 0.0);

        let cmd = DiffSetpoint { throttle: 0.5, yaw_rate_rads: 0.0, closed_loop_yaw_rate: true };
        for _ in 0..10 {
            rover.step(&cmd, &params, 0.1);
        }

        assert!((rover.pos_m[0] - 1.0).abs() < 1e-4);
        assert!(rover.pos_m[1].abs() < 1e-6);
        assert!((rover.velocity_ms()[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_spot_turn() {
        let params = RoverParams {
            yaw_rate_time_const_s: 0.0,
            ..Default::default()
        };
        let mut rover = SimRover::new(Vector2::zeros(), 0.0);

        let cmd = DiffSetpoint { throttle: 0.0, yaw_rate_rads: 1.0, closed_loop_yaw_rate: false };
        for _ in 0..10 {
            rover.step(&cmd, &params, 0.1);
        }

        assert!((rover.heading_rad - 1.0).abs() < 1e-4);
        assert_eq!(rover.pos_m, Vector2::zeros());
    }

    #[test]
    fn test_lag() {
        let params = RoverParams::default();
        let mut rover = SimRover::new(Vector2::zeros(), 0.0);

        let cmd = DiffSetpoint { throttle: 1.0, ..Default::default() };
        rover.step(&cmd, &params, 0.1);
        assert!(rover.speed_ms > 0.0 && rover.speed_ms < params.max_speed_ms);

        // Invalid commands are ignored
        let before = rover;
        rover.step(&DiffSetpoint { throttle: f32::NAN, ..Default::default() }, &params, 0.1);
        assert_eq!(rover, before);
    }
}
