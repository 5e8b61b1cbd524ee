//! # Waypoint store
//!
//! Holds the latest known position of the rover and the waypoints of the active mission leg in
//! both geodetic and local form. Every local point is produced by the same [`MapProjection`], and
//! all of them are recomputed whenever the store is updated, so they always share one anchor.
//!
//! Samples are "latest or previous": a sample which did not arrive this cycle, or which carries
//! unusable coordinates, leaves the stored value as it was.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::nav::{
    GlobalPosition, HomePosition, LocalPosition, MissionResult, NavState, PositionSetpoint,
    PositionSetpointTriplet
};
use log::{info, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::geo::{distance_m, is_valid_lat_lon, MapProjection};

use super::GuidanceParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The samples which arrived from upstream since the last cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamSamples {
    pub global_pos: Option<GlobalPosition>,
    pub local_pos: Option<LocalPosition>,
    pub home: Option<HomePosition>,
    pub triplet: Option<PositionSetpointTriplet>,
    pub mission_result: Option<MissionResult>,
    pub nav_state: Option<NavState>,
}

/// Local frame positions guidance needs for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Targets {
    /// Current position of the rover
    pub pos_m: Vector2<f32>,

    /// Start of the leg, the rover's position if the mission gave no previous waypoint
    pub prev_wp_m: Vector2<f32>,

    /// Waypoint being driven to
    pub curr_wp_m: Vector2<f32>,

    /// Waypoint after the current one, home if the mission gave none
    pub next_wp_m: Option<Vector2<f32>>,

    /// True if the current waypoint is the last one of the mission
    pub is_final: bool,

    /// Speed the mission asks for on this leg
    pub cruising_speed_ms: Option<f32>,
}

/// A geodetic point and its projection through the active anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Point {
    geo: Option<Vector2<f64>>,
    local_m: Option<Vector2<f32>>,
}

/// Stores waypoints and positions with a shared local frame.
#[derive(Debug, Clone, Default)]
pub struct WaypointStore {
    proj: MapProjection,

    /// Incremented every time the projection is re-anchored
    anchor_generation: u32,

    /// Reference timestamp of the local position the anchor was taken from, if any
    anchor_ref_timestamp_us: Option<u64>,

    pos: Point,

    /// Last local position whose reference matched the anchor, used if no global position is
    /// known
    local_xy_m: Option<Vector2<f32>>,

    prev_wp: Point,
    curr_wp: Point,
    next_wp: Point,
    home: Point,

    cruising_speed_ms: Option<f32>,
    mission_finished: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take in the latest samples, re-anchor the projection if needed, and recompute every local
    /// point.
    pub fn update(&mut self, samples: &UpstreamSamples, params: &GuidanceParams) {
        if let Some(ref gpos) = samples.global_pos {
            if is_valid_lat_lon(gpos.lat_deg, gpos.lon_deg) {
                self.pos.geo = Some(Vector2::new(gpos.lat_deg, gpos.lon_deg));
            }
            else {
                warn!(
                    "Rejected global position ({}, {}), keeping the previous position",
                    gpos.lat_deg, gpos.lon_deg
                );
            }
        }

        if let Some(ref home) = samples.home {
            if home.valid_hpos {
                match valid_geo(home.lat_deg, home.lon_deg) {
                    Some(geo) => self.home.geo = Some(geo),
                    None => warn!(
                        "Rejected home position ({}, {})",
                        home.lat_deg, home.lon_deg
                    )
                }
            }
        }

        if let Some(ref triplet) = samples.triplet {
            self.take_triplet(triplet);
        }

        if let Some(ref result) = samples.mission_result {
            if result.valid {
                self.mission_finished = result.finished;
            }
        }

        if let Some(ref lpos) = samples.local_pos {
            self.take_local_reference(lpos, params);
        }

        // Fall back on the rover's own position for an anchor
        if !self.proj.is_initialised() {
            if let Some(geo) = self.pos.geo {
                if self.proj.init_reference(geo[0], geo[1], 0) {
                    self.anchor_generation += 1;
                    self.anchor_ref_timestamp_us = None;
                    info!(
                        "Local frame anchored at the global position ({:.7}, {:.7})",
                        geo[0], geo[1]
                    );
                }
            }
        }

        if let Some(ref lpos) = samples.local_pos {
            if lpos.xy_valid
                && lpos.north_m.is_finite()
                && lpos.east_m.is_finite()
                && self.anchor_ref_timestamp_us.is_some()
                && self.anchor_ref_timestamp_us == Some(lpos.ref_timestamp_us)
            {
                self.local_xy_m = Some(Vector2::new(lpos.north_m, lpos.east_m));
            }
        }

        self.reproject();
    }

    /// The local frame positions for this cycle.
    ///
    /// `None` if there is no anchor, no known rover position, or no current waypoint.
    pub fn targets(&self) -> Option<Targets> {
        if !self.proj.is_initialised() {
            return None
        }

        let pos_m = self.pos.local_m?;
        let curr_wp_m = self.curr_wp.local_m?;
        let curr_geo = self.curr_wp.geo?;

        let prev_wp_m = self.prev_wp.local_m.unwrap_or(pos_m);

        let (next_geo, next_wp_m) = match self.next_wp.geo {
            Some(geo) => (Some(geo), self.next_wp.local_m),
            None => (self.home.geo, self.home.local_m)
        };

        let is_final = match next_geo {
            Some(geo) => geo == curr_geo,
            None => true
        };

        Some(Targets {
            pos_m,
            prev_wp_m,
            curr_wp_m,
            next_wp_m,
            is_final,
            cruising_speed_ms: self.cruising_speed_ms,
        })
    }

    pub fn mission_finished(&self) -> bool {
        self.mission_finished
    }

    pub fn anchor_generation(&self) -> u32 {
        self.anchor_generation
    }

    pub fn projection(&self) -> &MapProjection {
        &self.proj
    }

    /// Geodetic position of the current waypoint.
    pub fn current_wp(&self) -> Option<Vector2<f64>> {
        self.curr_wp.geo
    }

    /// Geodetic position of the rover.
    pub fn position(&self) -> Option<Vector2<f64>> {
        self.pos.geo
    }

    fn take_triplet(&mut self, triplet: &PositionSetpointTriplet) {
        // An invalid current setpoint means there's nothing to drive to
        if !triplet.current.valid {
            self.curr_wp.geo = None;
            self.cruising_speed_ms = None;
        }
        else {
            match setpoint_geo(&triplet.current) {
                Some(geo) => {
                    self.curr_wp.geo = Some(geo);
                    self.cruising_speed_ms = triplet.current.cruising_speed_ms
                        .filter(|s| s.is_finite() && *s > 0.0);
                },
                None => warn!(
                    "Rejected current waypoint ({}, {})",
                    triplet.current.lat_deg, triplet.current.lon_deg
                )
            }
        }

        take_setpoint(&mut self.prev_wp, &triplet.previous, "previous");
        take_setpoint(&mut self.next_wp, &triplet.next, "next");
    }

    /// Re-anchor the projection on the local frame reference if it is new or has moved.
    fn take_local_reference(&mut self, lpos: &LocalPosition, params: &GuidanceParams) {
        if !lpos.xy_global {
            return
        }

        let reference = match valid_geo(lpos.ref_lat_deg, lpos.ref_lon_deg) {
            Some(r) => r,
            None => {
                warn!(
                    "Rejected local frame reference ({}, {})",
                    lpos.ref_lat_deg, lpos.ref_lon_deg
                );
                return
            }
        };

        let moved = match self.proj.reference() {
            None => true,
            Some(anchor) => {
                self.anchor_ref_timestamp_us != Some(lpos.ref_timestamp_us)
                    || distance_m(&anchor, &reference) > params.anchor_tolerance_m as f64
            }
        };

        if moved && self.proj.init_reference(reference[0], reference[1], lpos.ref_timestamp_us) {
            self.anchor_generation += 1;
            self.anchor_ref_timestamp_us = Some(lpos.ref_timestamp_us);

            // Local positions relative to the old anchor are no longer meaningful
            self.local_xy_m = None;

            info!(
                "Local frame anchored at ({:.7}, {:.7}), reference time {} us",
                reference[0], reference[1], lpos.ref_timestamp_us
            );
        }
    }

    /// Recompute every local point through the active anchor.
    fn reproject(&mut self) {
        let proj = self.proj;
        let project = |p: &mut Point| {
            p.local_m = p.geo.and_then(|g| proj.project_vec(&g));
        };

        project(&mut self.pos);
        project(&mut self.prev_wp);
        project(&mut self.curr_wp);
        project(&mut self.next_wp);
        project(&mut self.home);

        if self.pos.local_m.is_none() {
            self.pos.local_m = self.local_xy_m;
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn valid_geo(lat_deg: f64, lon_deg: f64) -> Option<Vector2<f64>> {
    if is_valid_lat_lon(lat_deg, lon_deg) {
        Some(Vector2::new(lat_deg, lon_deg))
    }
    else {
        None
    }
}

fn setpoint_geo(sp: &PositionSetpoint) -> Option<Vector2<f64>> {
    valid_geo(sp.lat_deg, sp.lon_deg)
}

/// An invalid setpoint clears the point, a valid one with unusable coordinates is ignored.
fn take_setpoint(point: &mut Point, sp: &PositionSetpoint, name: &str) {
    if !sp.valid {
        point.geo = None;
        return
    }

    match setpoint_geo(sp) {
        Some(geo) => point.geo = Some(geo),
        None => warn!("Rejected {} waypoint ({}, {})", name, sp.lat_deg, sp.lon_deg)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
