//! Position samples

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Global (geodetic) position of the vehicle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalPosition {
    pub timestamp_us: u64,

    /// Latitude in degrees
    pub lat_deg: f64,

    /// Longitude in degrees
    pub lon_deg: f64,

    /// Altitude above mean sea level in meters
    pub alt_m: f32,

    /// Standard deviation of the horizontal position error in meters
    pub eph_m: f32,
}

/// Local (north-east) position of the vehicle together with the reference point of the local
/// frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalPosition {
    pub timestamp_us: u64,

    /// True if `north_m` and `east_m` are valid
    pub xy_valid: bool,

    pub north_m: f32,
    pub east_m: f32,

    /// Velocity in the north direction in meters/second
    pub vel_north_ms: f32,

    /// Velocity in the east direction in meters/second
    pub vel_east_ms: f32,

    /// Heading (yaw) in radians, zero to the north and positive clockwise
    pub heading_rad: f32,

    /// True if the reference point below is valid
    pub xy_global: bool,

    /// Latitude of the local frame origin in degrees
    pub ref_lat_deg: f64,

    /// Longitude of the local frame origin in degrees
    pub ref_lon_deg: f64,

    /// Time at which the local frame origin was last set. A change of this timestamp means the
    /// origin has moved.
    pub ref_timestamp_us: u64,
}

/// The home position of the vehicle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomePosition {
    pub timestamp_us: u64,

    pub lat_deg: f64,
    pub lon_deg: f64,

    /// True if the horizontal position is valid
    pub valid_hpos: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LocalPosition {
    /// Speed of the vehicle along its heading in meters/second.
    ///
    /// Negative when the vehicle is reversing.
    pub fn forward_speed_ms(&self) -> f32 {
        self.vel_north_ms * self.heading_rad.cos() + self.vel_east_ms * self.heading_rad.sin()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_forward_speed() {
        let mut lpos = LocalPosition {
            vel_north_ms: 1.0,
            vel_east_ms: 0.0,
            heading_rad: 0.0,
            ..Default::default()
        };
        assert!((lpos.forward_speed_ms() - 1.0).abs() < 1e-6);

        // Facing east while moving north means no forward speed
        lpos.heading_rad = std::f32::consts::FRAC_PI_2;
        assert!(lpos.forward_speed_ms().abs() < 1e-6);

        // Facing south while moving north is reversing
        lpos.heading_rad = std::f32::consts::PI;
        assert!((lpos.forward_speed_ms() + 1.0).abs() < 1e-6);
    }
}
