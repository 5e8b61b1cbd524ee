//! # Pure pursuit path tracking
//!
//! The path tracker keeps the rover on the straight line joining the previous and current
//! waypoints. Pure pursuit does this by steering towards a lookahead point, which is where a
//! circle of radius equal to the lookahead distance, centred on the rover, intersects the line
//! ahead of the rover. The lookahead distance grows with speed so the rover cuts in more gently
//! when driving fast.
//!
//! Three situations are handled:
//!
//! - The current waypoint is inside the lookahead circle: steer straight at the waypoint.
//! - The rover is further from the line than the lookahead distance: steer to the closest point
//!   on the line.
//! - Otherwise: steer to the forward intersection of the circle and the line.
//!
//! All positions are in the local north-east frame, headings are measured from north and are
//! positive clockwise.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;
use util::maths::ang_dist;

pub use params::PursuitParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Input to a path tracker for one cycle.
#[derive(Debug, Copy, Clone)]
pub struct TrackInput {
    /// Current position of the rover
    pub pos_m: Vector2<f32>,

    /// Current heading of the rover
    pub yaw_rad: f32,

    /// Start of the segment being tracked
    pub prev_wp_m: Vector2<f32>,

    /// End of the segment being tracked
    pub curr_wp_m: Vector2<f32>,

    /// Speed of the rover, never negative
    pub speed_ms: f32,
}

/// Output of a path tracker for one cycle.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct TrackOutput {
    /// Heading the rover should be pointing in
    pub desired_heading_rad: f32,

    /// Yaw rate which will bring the rover onto the path
    pub yaw_rate_rads: f32,

    /// Lookahead distance used this cycle
    pub lookahead_m: f32,
}

/// Pure pursuit path tracker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurePursuit {
    /// The lookahead point chosen in the last cycle
    target_m: Option<Vector2<f32>>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A path tracking law which produces a heading and yaw rate demand for a path segment.
pub trait PathTracker {
    fn track(&mut self, input: &TrackInput, params: &PursuitParams) -> TrackOutput;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PurePursuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lookahead point chosen in the last call to `track`.
    pub fn target(&self) -> Option<Vector2<f32>> {
        self.target_m
    }

    /// Find the point to steer towards.
    fn lookahead_point(input: &TrackInput, lookahead_m: f32) -> Vector2<f32> {
        let pos_to_wp = input.curr_wp_m - input.pos_m;
        let segment = input.curr_wp_m - input.prev_wp_m;
        let seg_length_m = segment.norm();

        // Close to the waypoint, or no segment to follow
        if pos_to_wp.norm() < lookahead_m || seg_length_m < std::f32::EPSILON {
            return input.curr_wp_m
        }

        let seg_dir = segment / seg_length_m;

        // Closest point to the rover on the (infinite) line through the segment
        let along_m = (input.pos_m - input.prev_wp_m).dot(&seg_dir);
        let closest_m = input.prev_wp_m + seg_dir * along_m;
        let crosstrack_m = (input.pos_m - closest_m).norm();

        if crosstrack_m >= lookahead_m {
            closest_m
        }
        else {
            let ahead_m = (lookahead_m * lookahead_m - crosstrack_m * crosstrack_m).sqrt();
            closest_m + seg_dir * ahead_m
        }
    }
}

impl PathTracker for PurePursuit {
    fn track(&mut self, input: &TrackInput, params: &PursuitParams) -> TrackOutput {
        let lookahead_m = params.lookahead_m(input.speed_ms);

        let target_m = Self::lookahead_point(input, lookahead_m);
        self.target_m = Some(target_m);

        let to_target = target_m - input.pos_m;
        let desired_heading_rad = if to_target.norm() > std::f32::EPSILON {
            to_target[1].atan2(to_target[0])
        }
        else {
            // Sitting on the target, keep the current heading
            input.yaw_rad
        };

        // Curvature of the arc through the lookahead point is 2 sin(alpha) / L, scaling by the
        // speed gives the yaw rate.
        let alpha_rad = ang_dist(input.yaw_rad, desired_heading_rad);
        let yaw_rate_rads = 2.0 * input.speed_ms.max(0.0) * alpha_rad.sin() / lookahead_m;

        TrackOutput {
            desired_heading_rad,
            yaw_rate_rads,
            lookahead_m,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
