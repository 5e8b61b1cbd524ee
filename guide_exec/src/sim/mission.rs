//! Simulated mission navigator
//!
//! Steps through a list of waypoints, advancing to the next one once the rover is inside the
//! acceptance radius of the current one, and reports the mission finished once the rover reaches
//! the last one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::nav::{MissionResult, PositionSetpoint, PositionSetpointTriplet};
use log::info;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::geo::distance_m;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A mission waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat_deg: f64,
    pub lon_deg: f64,

    /// Speed to drive this leg at, the guidance default if not given
    #[serde(default)]
    pub cruising_speed_ms: Option<f32>,
}

/// Mission navigator.
#[derive(Debug, Clone)]
pub struct SimMission {
    /// Where the rover started, used as the previous waypoint of the first leg
    start: Waypoint,

    waypoints: Vec<Waypoint>,

    acceptance_radius_m: f64,

    /// Index of the current waypoint
    index: usize,

    finished: bool,

    /// Set when the leg or the result changed and hasn't been read yet
    changed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            cruising_speed_ms: None,
        }
    }

    fn geo(&self) -> Vector2<f64> {
        Vector2::new(self.lat_deg, self.lon_deg)
    }

    fn setpoint(&self) -> PositionSetpoint {
        PositionSetpoint {
            valid: true,
            lat_deg: self.lat_deg,
            lon_deg: self.lon_deg,
            cruising_speed_ms: self.cruising_speed_ms,
        }
    }
}

impl SimMission {
    pub fn new(start: Waypoint, waypoints: Vec<Waypoint>, acceptance_radius_m: f64) -> Self {
        let finished = waypoints.is_empty();

        Self {
            start,
            waypoints,
            acceptance_radius_m,
            index: 0,
            finished,
            changed: true,
        }
    }

    /// Advance the mission given the rover's current position.
    pub fn update(&mut self, pos: &Vector2<f64>) {
        if self.finished {
            return
        }

        let current = match self.waypoints.get(self.index) {
            Some(wp) => wp.geo(),
            None => return
        };

        if distance_m(pos, &current) > self.acceptance_radius_m {
            return
        }

        if self.index + 1 < self.waypoints.len() {
            self.index += 1;
            info!("Waypoint {} reached, heading for waypoint {}", self.index - 1, self.index);
        }
        else {
            self.finished = true;
            info!("Final waypoint reached, mission finished");
        }

        self.changed = true;
    }

    /// The active leg. On the last leg the next waypoint repeats the current one.
    pub fn triplet(&self, timestamp_us: u64) -> PositionSetpointTriplet {
        let current = match self.waypoints.get(self.index) {
            Some(wp) => *wp,
            None => return PositionSetpointTriplet {
                timestamp_us,
                ..Default::default()
            }
        };

        let previous = match self.index {
            0 => self.start,
            i => self.waypoints[i - 1]
        };

        let next = self.waypoints.get(self.index + 1).copied().unwrap_or(current);

        PositionSetpointTriplet {
            timestamp_us,
            previous: previous.setpoint(),
            current: current.setpoint(),
            next: next.setpoint(),
        }
    }

    pub fn result(&self, timestamp_us: u64) -> MissionResult {
        MissionResult {
            timestamp_us,
            valid: !self.waypoints.is_empty(),
            seq_current: self.index as u16,
            seq_total: self.waypoints.len() as u16,
            finished: self.finished,
        }
    }

    /// Returns true once if the leg or result changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn mission() -> SimMission {
        SimMission::new(
            Waypoint::new(51.0, 0.0),
            vec![Waypoint::new(51.001, 0.0), Waypoint::new(51.001, 0.001)],
            2.0
        )
    }

    #[test]
    fn test_legs() {
        let mut m = mission();
        assert!(m.take_changed());
        assert!(!m.take_changed());

        let t = m.triplet(0);
        assert_eq!(t.previous.lat_deg, 51.0);
        assert_eq!(t.current.lat_deg, 51.001);
        assert_eq!(t.next.lon_deg, 0.001);

        // Far away, nothing changes
        m.update(&Vector2::new(51.0, 0.0));
        assert_eq!(m.index(), 0);
        assert!(!m.take_changed());

        // Arrive at the first waypoint
        m.update(&Vector2::new(51.001, 0.00001));
        assert_eq!(m.index(), 1);
        assert!(m.take_changed());

        let t = m.triplet(0);
        assert_eq!(t.previous.lon_deg, 0.0);
        assert_eq!(t.current, t.next);
        assert!(!m.result(0).finished);

        m.update(&Vector2::new(51.001, 0.001));
        assert!(m.is_finished());
        assert!(m.result(0).finished);
    }

    #[test]
    fn test_empty_mission() {
        let m = SimMission::new(Waypoint::new(51.0, 0.0), Vec::new(), 2.0);
        assert!(m.is_finished());
        assert!(!m.triplet(0).current.valid);
        assert!(!m.result(0).valid);
    }
}
