//! # Guidance controllers
//!
//! This module provides the controllers used by guidance: a PI controller used for both heading
//! and speed regulation, and the jerk limited slew which shapes the speed setpoint before it
//! reaches the speed controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use util::maths::interpolate;

// Internal
use super::GuidanceParams;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Speed setpoints smaller than this are treated as a request to stand still.
pub const SPEED_EPSILON_MS: f32 = 1e-4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A proportional-integral controller
#[derive(Debug, Serialize, Clone, Default)]
pub struct PiController {
    /// Proportional gain
    k_p: f32,

    /// Integral gain
    k_i: f32,

    /// Limit on the magnitude of the integral accumulation
    integral_limit: f32,

    /// Limit on the magnitude of the output
    output_limit: f32,

    /// The integral accumulation
    integral: f32
}

/// Jerk and acceleration limited slew of a speed setpoint.
#[derive(Debug, Serialize, Clone, Copy, Default)]
pub struct SpeedSlew {
    /// Current slewed speed
    speed_ms: f32,

    /// Rate of change of the slewed speed over the last step
    accel_mss: f32
}

/// Speed controller, turning a target speed into a throttle demand.
#[derive(Debug, Serialize, Clone, Default)]
pub struct SpeedCtrl {
    pid: PiController,
    slew: SpeedSlew
}

/// Output of the speed controller for one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedCtrlOutput {
    /// Normalised throttle demand
    pub throttle: f32,

    /// The slewed speed setpoint the throttle was computed for
    pub speed_setpoint_ms: f32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PiController {

    /// Create a new controller with the given gains and limits.
    pub fn new(k_p: f32, k_i: f32, integral_limit: f32, output_limit: f32) -> Self {
        Self {
            k_p, k_i,
            integral_limit: integral_limit.abs(),
            output_limit: output_limit.abs(),
            integral: 0f32
        }
    }

    /// Change the gains and limits, keeping the integral accumulation.
    pub fn set_gains(&mut self, k_p: f32, k_i: f32, integral_limit: f32, output_limit: f32) {
        self.k_p = k_p;
        self.k_i = k_i;
        self.integral_limit = integral_limit.abs();
        self.output_limit = output_limit.abs();
        self.integral = self.integral.max(-self.integral_limit).min(self.integral_limit);
    }

    /// Get the value of the controller for the given error over a step of `dt_s` seconds.
    ///
    /// A non-finite error or time step leaves the integral untouched and produces no output.
    pub fn get(&mut self, error: f32, dt_s: f32) -> f32 {
        if !error.is_finite() || !dt_s.is_finite() || dt_s < 0.0 {
            return 0f32
        }

        // Accumulate the integral term, saturating at the limit
        let integral = self.integral + error * dt_s;
        if integral.is_finite() {
            self.integral = integral.max(-self.integral_limit).min(self.integral_limit);
        }

        let out = self.k_p * error + self.k_i * self.integral;

        out.max(-self.output_limit).min(self.output_limit)
    }

    /// Clear the integral accumulation.
    pub fn reset(&mut self) {
        self.integral = 0f32;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }
}

impl SpeedSlew {

    /// Move the slewed speed towards `target_ms` over a step of `dt_s` seconds.
    ///
    /// The change in speed per step never exceeds `max_accel * dt` and the change in that
    /// change never exceeds `max_jerk * dt^2`. A limit of zero or less disables it. Near the
    /// target the acceleration is ramped down along the jerk limited braking curve so the
    /// setpoint settles without overshooting by more than a single jerk step.
    pub fn update(&mut self, target_ms: f32, max_accel: f32, max_jerk: f32, dt_s: f32) -> f32 {
        if !target_ms.is_finite() || !dt_s.is_finite() || dt_s <= 0.0 {
            return self.speed_ms
        }

        let accel_limit = if max_accel > 0.0 { max_accel } else { std::f32::INFINITY };
        let jerk_limit = if max_jerk > 0.0 { max_jerk } else { std::f32::INFINITY };
        let jerk_step = jerk_limit * dt_s;

        let error_ms = target_ms - self.speed_ms;

        // Land exactly on the target if that is within the limits, including coming to rest
        // in the following step.
        let landing_accel = error_ms / dt_s;
        if landing_accel.abs() <= accel_limit
            && landing_accel.abs() <= jerk_step
            && (landing_accel - self.accel_mss).abs() <= jerk_step
        {
            self.speed_ms = target_ms;
            self.accel_mss = landing_accel;
            return self.speed_ms
        }

        // Acceleration which would just bring us to rest on the target under the jerk limit
        let braking_accel = (2.0 * jerk_limit * error_ms.abs()).sqrt();
        let desired_accel = error_ms.signum() * accel_limit.min(braking_accel);

        // desired_accel is within the acceleration limit, so stepping towards it keeps the
        // acceleration in bounds. A lowered limit is approached at the jerk limit.
        let accel_change = (desired_accel - self.accel_mss).max(-jerk_step).min(jerk_step);
        self.accel_mss += accel_change;
        self.speed_ms += self.accel_mss * dt_s;

        self.speed_ms
    }

    /// Bring the slew to rest at zero speed.
    pub fn reset(&mut self) {
        self.speed_ms = 0f32;
        self.accel_mss = 0f32;
    }

    pub fn speed_ms(&self) -> f32 {
        self.speed_ms
    }

    pub fn accel_mss(&self) -> f32 {
        self.accel_mss
    }
}

impl SpeedCtrl {

    pub fn new() -> Self {
        Self::default()
    }

    /// Get the throttle demand which drives the rover from `actual_speed_ms` towards
    /// `target_ms`.
    ///
    /// The throttle is the sum of a feed-forward term, mapping the slewed setpoint linearly onto
    /// [0, 1] over [0, max speed], and PI feedback on the speed error. A setpoint at rest gives
    /// zero throttle and clears the integral.
    pub fn get(
        &mut self,
        target_ms: f32,
        actual_speed_ms: f32,
        dt_s: f32,
        params: &GuidanceParams
    ) -> SpeedCtrlOutput {
        self.pid.set_gains(params.speed_k_p, params.speed_k_i, 1.0, 1.0);

        let target_ms = target_ms
            .max(-params.max_speed_ms)
            .min(params.max_speed_ms);

        let speed_setpoint_ms = self.slew.update(
            target_ms,
            params.max_accel_mss,
            params.max_jerk_msss,
            dt_s
        );

        let throttle = if speed_setpoint_ms.abs() < SPEED_EPSILON_MS {
            self.pid.reset();
            0f32
        }
        else {
            let feed_forward = speed_setpoint_ms.signum() * interpolate(
                (0f32, params.max_speed_ms),
                (0f32, 1f32),
                speed_setpoint_ms.abs()
            );

            feed_forward + self.pid.get(speed_setpoint_ms - actual_speed_ms, dt_s)
        };

        SpeedCtrlOutput {
            throttle: throttle.max(-1.0).min(1.0),
            speed_setpoint_ms
        }
    }

    /// Clear the integral accumulation, keeping the slewed setpoint.
    pub fn reset_integral(&mut self) {
        self.pid.reset();
    }

    /// Clear the integral and bring the setpoint to rest.
    pub fn reset(&mut self) {
        self.pid.reset();
        self.slew.reset();
    }

    pub fn integral(&self) -> f32 {
        self.pid.integral()
    }

    pub fn speed_setpoint_ms(&self) -> f32 {
        self.slew.speed_ms()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Maximum speed from which the rover can come to rest at `final_speed_ms` within
/// `braking_distance_m`, given the acceleration and jerk limits.
pub fn max_speed_from_distance(
    max_jerk: f32,
    max_accel: f32,
    braking_distance_m: f32,
    final_speed_ms: f32
) -> f32 {
    let b = 4.0 * max_accel * max_accel / max_jerk;
    let c = -2.0 * max_accel * braking_distance_m.max(0.0) - final_speed_ms * final_speed_ms;

    0.5 * (-b + (b * b - 4.0 * c).sqrt())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
