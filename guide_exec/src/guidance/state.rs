//! Differential guidance state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::{
    nav::NavState,
    tm::{DiffSetpoint, GuidanceMode, GuidanceStatus}
};
use log::{info, trace, warn};
use util::{maths::ang_dist, module::State};

// Internal
use super::{
    ctrl::{max_speed_from_distance, SpeedCtrl},
    mode::{next_mode, stop_reason, GuidanceState, ModeInputs, StopReason},
    params::ParamsError,
    waypoints::{Targets, UpstreamSamples, WaypointStore},
    GuidanceParams
};
use crate::pursuit::{PathTracker, PurePursuit, TrackInput};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Differential drive guidance.
///
/// Each cycle the waypoint store is updated with whatever samples arrived, then
/// [`DiffGuidance::compute_guidance`] runs the mode machine and the controllers to produce the
/// command.
#[derive(Debug, Clone)]
pub struct DiffGuidance<T: PathTracker = PurePursuit> {
    tracker: T,

    waypoints: WaypointStore,

    state: GuidanceState,

    speed_ctrl: SpeedCtrl,

    /// Sum of all valid cycle time steps
    time_s: f64,
}

/// Input data for one guidance cycle through the [`State`] interface.
#[derive(Debug, Clone)]
pub struct GuidanceInput {
    /// Samples which arrived since the last cycle
    pub samples: UpstreamSamples,

    /// Current heading of the rover
    pub yaw_rad: f32,

    /// Current forward speed of the rover
    pub speed_ms: f32,

    pub nav_state: NavState,

    /// Time since the last cycle
    pub dt_s: f32,

    /// Parameter snapshot for this cycle
    pub params: GuidanceParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T: PathTracker> DiffGuidance<T> {
    /// Create a new guidance instance using the given path tracker.
    pub fn new(tracker: T, params: &GuidanceParams) -> Self {
        Self {
            tracker,
            waypoints: WaypointStore::new(),
            state: GuidanceState::enter(params.initial_mode, params),
            speed_ctrl: SpeedCtrl::new(),
            time_s: 0.0,
        }
    }

    /// Update the waypoint store with the latest samples.
    pub fn update_waypoints(&mut self, samples: &UpstreamSamples, params: &GuidanceParams) {
        self.waypoints.update(samples, params);
    }

    /// Compute the command for this cycle.
    ///
    /// Unusable inputs (non-finite heading, speed or time step, or no anchor, position or
    /// current waypoint) produce the zero command. If navigation is inactive or the mission is
    /// finished guidance still moves to `Stopped` and resets its controllers. Otherwise the mode
    /// is held, none of the controllers are stepped, and the returned status is marked as
    /// degraded.
    pub fn compute_guidance(
        &mut self,
        yaw_rad: f32,
        speed_ms: f32,
        nav_state: NavState,
        dt_s: f32,
        params: &GuidanceParams
    ) -> (DiffSetpoint, GuidanceStatus) {

        // ---- VALIDATE INPUTS ----

        let inputs_valid = yaw_rad.is_finite()
            && speed_ms.is_finite()
            && dt_s.is_finite()
            && dt_s > 0.0;

        let targets = match (self.waypoints.targets(), inputs_valid) {
            (Some(t), true) => t,
            (targets, _) => {
                // Holding needs neither a pose nor a waypoint
                if let Some(reason) = stop_reason(
                    nav_state,
                    self.waypoints.mission_finished(),
                    false,
                    std::f32::INFINITY,
                    params
                ) {
                    return self.stopped_output(reason, dt_s, params)
                }

                if targets.is_none() {
                    warn!("No anchor, position or current waypoint available, holding still");
                }
                else {
                    warn!(
                        "Invalid guidance inputs (yaw: {}, speed: {}, dt: {}), holding still",
                        yaw_rad, speed_ms, dt_s
                    );
                }
                return self.degraded_output()
            }
        };

        self.time_s += dt_s as f64;

        // ---- PATH TRACKING ----

        let track = self.tracker.track(
            &TrackInput {
                pos_m: targets.pos_m,
                yaw_rad,
                prev_wp_m: targets.prev_wp_m,
                curr_wp_m: targets.curr_wp_m,
                speed_ms: speed_ms.max(0.0),
            },
            &params.pursuit
        );

        let heading_error_rad = ang_dist(yaw_rad, track.desired_heading_rad);
        let distance_to_wp_m = (targets.curr_wp_m - targets.pos_m).norm();

        // ---- MODE TRANSITION ----

        let stop = stop_reason(
            nav_state,
            self.waypoints.mission_finished(),
            targets.is_final,
            distance_to_wp_m,
            params
        );

        let current_mode = self.state.mode();
        let new_mode = next_mode(
            current_mode,
            &ModeInputs {
                heading_error_rad,
                speed_ms,
                stop,
            },
            params
        );

        if new_mode != current_mode {
            match (new_mode, stop) {
                (GuidanceMode::Stopped, Some(reason)) => info!(
                    "Guidance {} -> {} ({})", current_mode, new_mode, reason
                ),
                _ => info!(
                    "Guidance {} -> {} (heading error {:.1} deg, speed {:.2} m/s)",
                    current_mode, new_mode, heading_error_rad.to_degrees(), speed_ms
                )
            }

            self.enter_mode(new_mode, params);
        }

        // ---- CONTROL ----

        let (desired_speed_ms, yaw_rate_rads, closed_loop_yaw_rate) = match self.state {
            GuidanceState::SpotTurning(ref mut spot_turn) => {
                // Only pivot once slow enough, otherwise brake first
                let yaw_rate = if speed_ms < params.turn_max_speed_ms {
                    spot_turn.heading_ctrl.set_gains(
                        params.heading_k_p,
                        params.heading_k_i,
                        1.0,
                        params.max_yaw_rate_rads
                    );
                    spot_turn.heading_ctrl.get(heading_error_rad, dt_s)
                }
                else {
                    0.0
                };

                (0.0, yaw_rate, false)
            },
            GuidanceState::Driving => {
                let desired_speed = if heading_error_rad.abs() > params.trans_drive_turn_rad {
                    // Too fast to start a spot turn, slow down for it
                    0.0
                }
                else {
                    Self::driving_speed(&targets, distance_to_wp_m, params)
                };

                (desired_speed, track.yaw_rate_rads, true)
            },
            GuidanceState::Stopped => (0.0, 0.0, false)
        };

        let mut setpoint = match self.state {
            GuidanceState::Stopped => DiffSetpoint::zero(),
            _ => {
                let speed_out = self.speed_ctrl.get(desired_speed_ms, speed_ms, dt_s, params);

                DiffSetpoint {
                    throttle: speed_out.throttle,
                    yaw_rate_rads: yaw_rate_rads
                        .max(-params.max_yaw_rate_rads)
                        .min(params.max_yaw_rate_rads),
                    closed_loop_yaw_rate,
                }
            }
        };

        let mut degraded = false;
        if !setpoint.is_finite() {
            warn!("Guidance produced a non-finite command {:?}, holding still", setpoint);
            setpoint = DiffSetpoint::zero();
            self.speed_ctrl.reset();
            degraded = true;
        }

        let status = GuidanceStatus {
            time_s: self.time_s,
            mode: self.state.mode(),
            desired_speed_ms,
            speed_setpoint_ms: self.speed_ctrl.speed_setpoint_ms(),
            pid_throttle_integral: self.speed_ctrl.integral(),
            pid_heading_integral: self.state.heading_integral(),
            heading_error_deg: heading_error_rad.to_degrees(),
            lookahead_distance_m: track.lookahead_m,
            distance_to_wp_m,
            degraded,
            setpoint,
        };

        trace!("Guidance status: {:?}", status);

        (setpoint, status)
    }

    pub fn mode(&self) -> GuidanceMode {
        self.state.mode()
    }

    pub fn waypoints(&self) -> &WaypointStore {
        &self.waypoints
    }

    /// Target speed while driving: the mission's cruising speed, capped so the rover can brake to
    /// rest at the current waypoint.
    fn driving_speed(targets: &Targets, distance_to_wp_m: f32, params: &GuidanceParams) -> f32 {
        let mut speed = targets.cruising_speed_ms
            .unwrap_or(params.miss_speed_default_ms)
            .min(params.max_speed_ms);

        if params.max_jerk_msss > std::f32::EPSILON && params.max_accel_mss > std::f32::EPSILON {
            let braking_speed = max_speed_from_distance(
                params.max_jerk_msss,
                params.max_accel_mss,
                distance_to_wp_m,
                0.0
            );

            if braking_speed.is_finite() {
                speed = speed.min(braking_speed);
            }
        }

        speed.max(0.0)
    }

    /// Switch to the given mode, running its entry actions.
    fn enter_mode(&mut self, mode: GuidanceMode, params: &GuidanceParams) {
        self.state = GuidanceState::enter(mode, params);

        match mode {
            GuidanceMode::SpotTurning => self.speed_ctrl.reset_integral(),
            GuidanceMode::Stopped => self.speed_ctrl.reset(),
            GuidanceMode::Driving => ()
        }
    }

    /// Stop without a usable pose or waypoint, which holding doesn't need.
    fn stopped_output(
        &mut self,
        reason: StopReason,
        dt_s: f32,
        params: &GuidanceParams
    ) -> (DiffSetpoint, GuidanceStatus) {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.time_s += dt_s as f64;
        }

        let current_mode = self.state.mode();
        if current_mode != GuidanceMode::Stopped {
            info!("Guidance {} -> {} ({})", current_mode, GuidanceMode::Stopped, reason);
            self.enter_mode(GuidanceMode::Stopped, params);
        }

        let setpoint = DiffSetpoint::zero();

        let status = GuidanceStatus {
            time_s: self.time_s,
            mode: self.state.mode(),
            speed_setpoint_ms: self.speed_ctrl.speed_setpoint_ms(),
            pid_throttle_integral: self.speed_ctrl.integral(),
            pid_heading_integral: self.state.heading_integral(),
            setpoint,
            ..Default::default()
        };

        trace!("Guidance status: {:?}", status);

        (setpoint, status)
    }

    /// Zero command and a status marked as degraded, holding all state.
    fn degraded_output(&self) -> (DiffSetpoint, GuidanceStatus) {
        let setpoint = DiffSetpoint::zero();

        let status = GuidanceStatus {
            time_s: self.time_s,
            mode: self.state.mode(),
            speed_setpoint_ms: self.speed_ctrl.speed_setpoint_ms(),
            pid_throttle_integral: self.speed_ctrl.integral(),
            pid_heading_integral: self.state.heading_integral(),
            degraded: true,
            setpoint,
            ..Default::default()
        };

        (setpoint, status)
    }
}

impl<T: PathTracker> State for DiffGuidance<T> {
    type InitData = GuidanceParams;
    type InitError = ParamsError;

    type InputData = GuidanceInput;
    type OutputData = DiffSetpoint;
    type StatusReport = GuidanceStatus;
    type ProcError = std::convert::Infallible;

    /// Validate the parameters and reset guidance into its initial mode.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.validate()?;

        self.state = GuidanceState::enter(init_data.initial_mode, &init_data);
        self.speed_ctrl.reset();
        self.time_s = 0.0;

        Ok(())
    }

    /// Run a full guidance cycle: waypoint update followed by the guidance computation.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.update_waypoints(&input_data.samples, &input_data.params);

        Ok(self.compute_guidance(
            input_data.yaw_rad,
            input_data.speed_ms,
            input_data.nav_state,
            input_data.dt_s,
            &input_data.params
        ))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::nav::{
        GlobalPosition, MissionResult, PositionSetpoint, PositionSetpointTriplet
    };
    use crate::pursuit::{PursuitParams, TrackOutput};

    const LAT: f64 = 47.397742;
    const LON: f64 = 8.545594;
    const DT: f32 = 0.1;

    /// Path tracker which always gives the same answer
    #[derive(Debug, Clone)]
    struct FixedTracker {
        desired_heading_rad: f32,
        yaw_rate_rads: f32,
    }

    impl PathTracker for FixedTracker {
        fn track(&mut self, _input: &TrackInput, _params: &PursuitParams) -> TrackOutput {
            TrackOutput {
                desired_heading_rad: self.desired_heading_rad,
                yaw_rate_rads: self.yaw_rate_rads,
                lookahead_m: 1.0,
            }
        }
    }

    fn samples(wp_north_deg: f64) -> UpstreamSamples {
        UpstreamSamples {
            global_pos: Some(GlobalPosition {
                lat_deg: LAT,
                lon_deg: LON,
                ..Default::default()
            }),
            triplet: Some(PositionSetpointTriplet {
                timestamp_us: 0,
                previous: PositionSetpoint::new(LAT, LON),
                current: PositionSetpoint::new(LAT + wp_north_deg, LON),
                next: PositionSetpoint::new(LAT + 2.0 * wp_north_deg, LON),
            }),
            mission_result: Some(MissionResult {
                valid: true,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn guidance(heading_deg: f32, yaw_rate: f32) -> DiffGuidance<FixedTracker> {
        let params = GuidanceParams::default();
        let mut g = DiffGuidance::new(
            FixedTracker {
                desired_heading_rad: heading_deg.to_radians(),
                yaw_rate_rads: yaw_rate,
            },
            &params
        );
        g.update_waypoints(&samples(0.001), &params);
        g
    }

    #[test]
    fn test_large_error_spot_turn() {
        let params = GuidanceParams::default();
        let mut g = guidance(170.0, 0.0);

        let (sp, status) = g.compute_guidance(0.0, 0.05, NavState::Mission, DT, &params);

        assert_eq!(g.mode(), GuidanceMode::SpotTurning);
        assert_eq!(status.mode, GuidanceMode::SpotTurning);
        assert!((sp.yaw_rate_rads - params.max_yaw_rate_rads).abs() < 1e-6);
        assert!(!sp.closed_loop_yaw_rate);
        assert_eq!(sp.throttle, 0.0);
        assert!(!status.degraded);
    }

    #[test]
    fn test_small_error_drives() {
        let params = GuidanceParams::default();
        let mut g = guidance(5.0, 0.3);

        let (sp, status) = g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);

        assert_eq!(status.mode, GuidanceMode::Driving);
        assert!(sp.closed_loop_yaw_rate);
        assert!((sp.yaw_rate_rads - 0.3).abs() < 1e-6);
        assert!(sp.throttle > 0.0);
        assert!(status.desired_speed_ms > 0.0);
    }

    #[test]
    fn test_hold_gives_zero() {
        let params = GuidanceParams::default();
        let mut g = guidance(5.0, 0.3);

        // Get moving first
        for _ in 0..10 {
            g.compute_guidance(0.0, 0.5, NavState::Mission, DT, &params);
        }

        let (sp, status) = g.compute_guidance(0.0, 0.5, NavState::Hold, DT, &params);

        assert_eq!(status.mode, GuidanceMode::Stopped);
        assert_eq!(sp, DiffSetpoint { throttle: 0.0, yaw_rate_rads: 0.0, closed_loop_yaw_rate: false });
        assert_eq!(status.pid_throttle_integral, 0.0);
        assert_eq!(status.pid_heading_integral, 0.0);
        assert_eq!(status.speed_setpoint_ms, 0.0);

        // Resumes when navigation does
        g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        assert_eq!(g.mode(), GuidanceMode::Driving);
    }

    #[test]
    fn test_hold_without_waypoint_stops() {
        let params = GuidanceParams::default();
        let mut g = guidance(5.0, 0.3);

        // Stuck at rest while driving, so the speed integral winds up
        for _ in 0..60 {
            g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        }
        assert!(g.speed_ctrl.integral() > 0.0);
        assert!(g.speed_ctrl.speed_setpoint_ms() > 0.5);

        // Mission end: the current waypoint is withdrawn along with the hold
        let mut withdrawn = samples(0.001);
        if let Some(ref mut t) = withdrawn.triplet {
            t.current.valid = false;
        }
        g.update_waypoints(&withdrawn, &params);
        assert!(g.waypoints().targets().is_none());

        let (sp, status) = g.compute_guidance(0.0, 0.0, NavState::Hold, DT, &params);
        assert_eq!(sp, DiffSetpoint::zero());
        assert_eq!(status.mode, GuidanceMode::Stopped);
        assert!(!status.degraded);
        assert_eq!(status.pid_throttle_integral, 0.0);
        assert_eq!(status.speed_setpoint_ms, 0.0);

        // A new leg ramps up from rest
        g.update_waypoints(&samples(0.001), &params);
        let (sp, status) = g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        assert_eq!(status.mode, GuidanceMode::Driving);
        assert!(status.speed_setpoint_ms <= params.max_accel_mss * DT + 1e-6);
        assert!(sp.throttle > 0.0);
        assert!(sp.throttle < 0.05);
    }

    #[test]
    fn test_hold_with_invalid_pose_stops() {
        let params = GuidanceParams::default();
        let mut g = guidance(5.0, 0.3);

        for _ in 0..20 {
            g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        }

        let (sp, status) = g.compute_guidance(f32::NAN, 0.0, NavState::Hold, DT, &params);
        assert_eq!(sp, DiffSetpoint::zero());
        assert_eq!(g.mode(), GuidanceMode::Stopped);
        assert!(!status.degraded);
        assert_eq!(status.pid_throttle_integral, 0.0);
        assert_eq!(status.speed_setpoint_ms, 0.0);
    }

    #[test]
    fn test_non_finite_inputs() {
        let params = GuidanceParams::default();
        let mut g = guidance(170.0, 0.0);
        g.compute_guidance(0.0, 0.05, NavState::Mission, DT, &params);
        let integral = g.state.heading_integral();

        for (yaw, speed, dt) in [
            (f32::NAN, 0.0, DT),
            (0.0, f32::INFINITY, DT),
            (0.0, 0.0, f32::NAN),
            (0.0, 0.0, 0.0)
        ].iter() {
            let (sp, status) = g.compute_guidance(*yaw, *speed, NavState::Mission, *dt, &params);
            assert_eq!(sp, DiffSetpoint::zero());
            assert!(status.degraded);
            assert_eq!(status.mode, GuidanceMode::SpotTurning);
        }

        // Controllers were not stepped
        assert_eq!(g.state.heading_integral(), integral);
    }

    #[test]
    fn test_no_waypoint_is_degraded() {
        let params = GuidanceParams::default();
        let mut g = DiffGuidance::new(PurePursuit::new(), &params);

        let (sp, status) = g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        assert_eq!(sp, DiffSetpoint::zero());
        assert!(status.degraded);
    }

    #[test]
    fn test_yaw_rate_never_exceeds_max() {
        let params = GuidanceParams::default();

        for &(heading, yaw_rate) in [(5.0, 10.0), (-5.0, -10.0), (90.0, 0.0), (-179.0, 0.0)].iter() {
            let mut g = guidance(heading, yaw_rate);
            for _ in 0..50 {
                let (sp, _) = g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
                assert!(sp.yaw_rate_rads.abs() <= params.max_yaw_rate_rads);
                assert!(sp.throttle.abs() <= 1.0);
            }
        }
    }

    #[test]
    fn test_too_fast_to_turn_brakes() {
        let params = GuidanceParams::default();
        let mut g = guidance(90.0, 0.2);

        let (sp, status) = g.compute_guidance(0.0, 1.0, NavState::Mission, DT, &params);

        // Stays driving, braking towards rest while following the tracker
        assert_eq!(status.mode, GuidanceMode::Driving);
        assert_eq!(status.desired_speed_ms, 0.0);
        assert!(sp.closed_loop_yaw_rate);
        assert!((sp.yaw_rate_rads - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_spot_turn_waits_for_speed() {
        let params = GuidanceParams::default();
        let mut g = guidance(170.0, 0.0);

        g.compute_guidance(0.0, 0.05, NavState::Mission, DT, &params);
        assert_eq!(g.mode(), GuidanceMode::SpotTurning);

        // Still rolling above the gate, no rotation
        let (sp, _) = g.compute_guidance(0.0, 0.5, NavState::Mission, DT, &params);
        assert_eq!(sp.yaw_rate_rads, 0.0);
    }

    #[test]
    fn test_final_waypoint_stops() {
        let params = GuidanceParams::default();
        let mut g = DiffGuidance::new(
            FixedTracker { desired_heading_rad: 0.0, yaw_rate_rads: 0.0 },
            &params
        );

        // Current and next waypoint equal and 1 m away
        let mut s = samples(0.00001);
        if let Some(ref mut t) = s.triplet {
            t.next = t.current;
        }
        g.update_waypoints(&s, &params);

        let (sp, status) = g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        assert_eq!(status.mode, GuidanceMode::Stopped);
        assert_eq!(sp, DiffSetpoint::zero());
    }

    #[test]
    fn test_mission_finished_stops() {
        let params = GuidanceParams::default();
        let mut g = guidance(0.0, 0.0);

        g.update_waypoints(&UpstreamSamples {
            mission_result: Some(MissionResult {
                valid: true,
                finished: true,
                ..Default::default()
            }),
            ..Default::default()
        }, &params);

        let (_, status) = g.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        assert_eq!(status.mode, GuidanceMode::Stopped);
    }

    #[test]
    fn test_braking_near_waypoint() {
        let params = GuidanceParams::default();

        let mut far = guidance(0.0, 0.0);
        let mut near = DiffGuidance::new(
            FixedTracker { desired_heading_rad: 0.0, yaw_rate_rads: 0.0 },
            &params
        );
        near.update_waypoints(&samples(0.00001), &params);

        let (_, far_status) = far.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);
        let (_, near_status) = near.compute_guidance(0.0, 0.0, NavState::Mission, DT, &params);

        assert_eq!(far_status.desired_speed_ms, params.miss_speed_default_ms);
        assert!(near_status.desired_speed_ms < far_status.desired_speed_ms);
    }

    #[test]
    fn test_state_interface() {
        let mut g = DiffGuidance::new(PurePursuit::new(), &GuidanceParams::default());

        let mut bad = GuidanceParams::default();
        bad.max_speed_ms = 0.0;
        assert!(g.init(bad).is_err());

        let mut params = GuidanceParams::default();
        params.initial_mode = GuidanceMode::Stopped;
        assert!(g.init(params).is_ok());
        assert_eq!(g.mode(), GuidanceMode::Stopped);

        let input = GuidanceInput {
            samples: samples(0.001),
            yaw_rad: 0.0,
            speed_ms: 0.0,
            nav_state: NavState::Mission,
            dt_s: DT,
            params,
        };

        let (sp, status) = match g.proc(&input) {
            Ok(o) => o,
            Err(e) => match e {}
        };
        assert_eq!(status.mode, GuidanceMode::Driving);
        assert!(sp.throttle > 0.0);
        assert!((status.time_s - DT as f64).abs() < 1e-9);
    }
}
