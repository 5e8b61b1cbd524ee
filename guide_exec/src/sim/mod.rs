//! # Guidance simulation
//!
//! A minimal closed loop world for exercising guidance without a vehicle: a kinematic skid steer
//! rover, a mission navigator stepping through a waypoint list, and a world which turns both
//! into the upstream samples guidance expects.
//!
//! The world publishes its local frame anchored at the rover's start position, so the rover's
//! local position is also its position relative to the start.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mission;
mod rover;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    nav::{GlobalPosition, HomePosition, LocalPosition, NavState},
    tm::DiffSetpoint
};
use log::warn;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::geo::MapProjection;

use crate::{exec::StateProvider, guidance::UpstreamSamples};

pub use mission::{SimMission, Waypoint};
pub use rover::{RoverParams, SimRover};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Reference timestamp given to the world's local frame.
const LOCAL_REF_TIMESTAMP_US: u64 = 1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation scenario, loaded from a TOML mission file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Initial heading of the rover in degrees
    pub start_heading_deg: f32,

    /// Distance at which the navigator moves on to the next waypoint
    pub acceptance_radius_m: f64,

    /// Navigation state the mission runs in
    #[serde(default = "default_nav_state")]
    pub nav_state: NavState,

    /// Start position of the rover, also the home position
    pub start: Waypoint,

    #[serde(default)]
    pub rover: RoverParams,

    pub waypoints: Vec<Waypoint>,
}

/// The simulated world.
#[derive(Debug, Clone)]
pub struct SimWorld {
    config: SimConfig,

    rover: SimRover,
    mission: SimMission,

    /// Projection of the local frame, anchored at the start position
    proj: MapProjection,

    time_us: u64,

    /// Set until the one-off samples (home, navigation state) have been sent
    first_samples: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimWorld {
    pub fn new(config: SimConfig) -> Self {
        let proj = MapProjection::with_reference(
            config.start.lat_deg,
            config.start.lon_deg,
            LOCAL_REF_TIMESTAMP_US
        );

        let mission = SimMission::new(
            config.start,
            config.waypoints.clone(),
            config.acceptance_radius_m
        );

        Self {
            rover: SimRover::new(Vector2::zeros(), config.start_heading_deg.to_radians()),
            mission,
            proj,
            time_us: 0,
            first_samples: true,
            config,
        }
    }

    /// Step the world forward by `dt_s` seconds under the given command.
    pub fn step(&mut self, cmd: &DiffSetpoint, dt_s: f32) {
        self.rover.step(cmd, &self.config.rover, dt_s);

        if dt_s.is_finite() && dt_s > 0.0 {
            self.time_us += (dt_s as f64 * 1e6) as u64;
        }

        if let Some(pos) = self.position() {
            self.mission.update(&pos);
        }
    }

    /// Geodetic position of the rover.
    pub fn position(&self) -> Option<Vector2<f64>> {
        self.proj.reproject(self.rover.pos_m[0] as f64, self.rover.pos_m[1] as f64)
    }

    pub fn rover(&self) -> &SimRover {
        &self.rover
    }

    pub fn mission(&self) -> &SimMission {
        &self.mission
    }

    pub fn time_s(&self) -> f64 {
        self.time_us as f64 * 1e-6
    }

    fn local_position(&self) -> LocalPosition {
        let vel = self.rover.velocity_ms();

        LocalPosition {
            timestamp_us: self.time_us,
            xy_valid: true,
            north_m: self.rover.pos_m[0],
            east_m: self.rover.pos_m[1],
            vel_north_ms: vel[0],
            vel_east_ms: vel[1],
            heading_rad: self.rover.heading_rad,
            xy_global: true,
            ref_lat_deg: self.config.start.lat_deg,
            ref_lon_deg: self.config.start.lon_deg,
            ref_timestamp_us: LOCAL_REF_TIMESTAMP_US,
        }
    }
}

impl StateProvider for SimWorld {
    fn latest(&mut self) -> UpstreamSamples {
        let mut samples = UpstreamSamples {
            local_pos: Some(self.local_position()),
            ..Default::default()
        };

        match self.position() {
            Some(pos) => samples.global_pos = Some(GlobalPosition {
                timestamp_us: self.time_us,
                lat_deg: pos[0],
                lon_deg: pos[1],
                alt_m: 0.0,
                eph_m: 0.0,
            }),
            None => warn!("Simulated rover position could not be converted to lat/lon")
        }

        if self.first_samples {
            samples.home = Some(HomePosition {
                timestamp_us: self.time_us,
                lat_deg: self.config.start.lat_deg,
                lon_deg: self.config.start.lon_deg,
                valid_hpos: true,
            });
            samples.nav_state = Some(self.config.nav_state);
            self.first_samples = false;
        }

        if self.mission.take_changed() {
            samples.triplet = Some(self.mission.triplet(self.time_us));
            samples.mission_result = Some(self.mission.result(self.time_us));
        }

        samples
    }
}

fn default_nav_state() -> NavState {
    NavState::Mission
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
