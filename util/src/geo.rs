//! # Geodetic projection
//!
//! Conversion between geodetic coordinates (latitude/longitude in degrees) and a local planar
//! north-east frame anchored at a reference point. The projection is azimuthal equidistant on a
//! spherical Earth, which is accurate to well under a metre within a few kilometres of the
//! anchor.
//!
//! Geodetic points are carried as `Vector2<f64>` of `[lat_deg, lon_deg]`, local points as
//! `Vector2<f32>` of `[north_m, east_m]`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Mean radius of the Earth in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Local tangent plane projection anchored at a reference point.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MapProjection {
    /// Reference latitude in radians
    ref_lat_rad: f64,

    /// Reference longitude in radians
    ref_lon_rad: f64,

    ref_sin_lat: f64,
    ref_cos_lat: f64,

    /// Timestamp of the reference as given by the source of the anchor
    ref_timestamp_us: u64,

    initialised: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MapProjection {
    /// Create a new, uninitialised projection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a projection anchored at the given point.
    pub fn with_reference(lat_deg: f64, lon_deg: f64, timestamp_us: u64) -> Self {
        let mut proj = Self::new();
        proj.init_reference(lat_deg, lon_deg, timestamp_us);
        proj
    }

    /// (Re)initialise the anchor of the projection.
    ///
    /// Invalid references leave the projection unchanged, returning `false`.
    pub fn init_reference(&mut self, lat_deg: f64, lon_deg: f64, timestamp_us: u64) -> bool {
        if !is_valid_lat_lon(lat_deg, lon_deg) {
            return false
        }

        self.ref_lat_rad = lat_deg.to_radians();
        self.ref_lon_rad = lon_deg.to_radians();
        self.ref_sin_lat = self.ref_lat_rad.sin();
        self.ref_cos_lat = self.ref_lat_rad.cos();
        self.ref_timestamp_us = timestamp_us;
        self.initialised = true;

        true
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// The reference point in degrees, `None` if the projection has no anchor.
    pub fn reference(&self) -> Option<Vector2<f64>> {
        if self.initialised {
            Some(Vector2::new(
                self.ref_lat_rad.to_degrees(),
                self.ref_lon_rad.to_degrees()
            ))
        }
        else {
            None
        }
    }

    pub fn reference_timestamp(&self) -> u64 {
        self.ref_timestamp_us
    }

    /// Project a geodetic point into the local north-east frame.
    ///
    /// Returns `None` if the projection has no anchor or the point is not a valid coordinate.
    pub fn project(&self, lat_deg: f64, lon_deg: f64) -> Option<Vector2<f32>> {
        if !self.initialised || !is_valid_lat_lon(lat_deg, lon_deg) {
            return None
        }

        let lat_rad = lat_deg.to_radians();
        let lon_rad = lon_deg.to_radians();

        let sin_lat = lat_rad.sin();
        let cos_lat = lat_rad.cos();
        let cos_d_lon = (lon_rad - self.ref_lon_rad).cos();

        let arg = (self.ref_sin_lat * sin_lat + self.ref_cos_lat * cos_lat * cos_d_lon)
            .max(-1.0)
            .min(1.0);
        let c = arg.acos();

        // Scale factor of the azimuthal equidistant projection, unity at the anchor
        let k = if c.abs() > 0.0 { c / c.sin() } else { 1.0 };

        let north_m = k * (self.ref_cos_lat * sin_lat - self.ref_sin_lat * cos_lat * cos_d_lon)
            * EARTH_RADIUS_M;
        let east_m = k * cos_lat * (lon_rad - self.ref_lon_rad).sin() * EARTH_RADIUS_M;

        if north_m.is_finite() && east_m.is_finite() {
            Some(Vector2::new(north_m as f32, east_m as f32))
        }
        else {
            None
        }
    }

    /// Project a geodetic point given as `[lat_deg, lon_deg]`.
    pub fn project_vec(&self, point: &Vector2<f64>) -> Option<Vector2<f32>> {
        self.project(point[0], point[1])
    }

    /// Convert a local north-east point back into geodetic coordinates.
    pub fn reproject(&self, north_m: f64, east_m: f64) -> Option<Vector2<f64>> {
        if !self.initialised || !north_m.is_finite() || !east_m.is_finite() {
            return None
        }

        let x_rad = north_m / EARTH_RADIUS_M;
        let y_rad = east_m / EARTH_RADIUS_M;
        let c = (x_rad * x_rad + y_rad * y_rad).sqrt();

        let (lat_rad, lon_rad) = if c.abs() > 0.0 {
            let sin_c = c.sin();
            let cos_c = c.cos();

            let lat_rad = (cos_c * self.ref_sin_lat + (x_rad * sin_c * self.ref_cos_lat) / c)
                .asin();
            let lon_rad = self.ref_lon_rad + (y_rad * sin_c).atan2(
                c * self.ref_cos_lat * cos_c - x_rad * self.ref_sin_lat * sin_c
            );

            (lat_rad, lon_rad)
        }
        else {
            (self.ref_lat_rad, self.ref_lon_rad)
        };

        Some(Vector2::new(lat_rad.to_degrees(), lon_rad.to_degrees()))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Returns true if the given latitude and longitude are finite and in range.
pub fn is_valid_lat_lon(lat_deg: f64, lon_deg: f64) -> bool {
    lat_deg.is_finite()
        && lon_deg.is_finite()
        && lat_deg.abs() <= 90.0
        && lon_deg.abs() <= 180.0
}

/// Great circle distance between two geodetic points in meters (haversine).
pub fn distance_m(from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    let lat_from = from[0].to_radians();
    let lat_to = to[0].to_radians();
    let d_lat = (to[0] - from[0]).to_radians();
    let d_lon = (to[1] - from[1]).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat_from.cos() * lat_to.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt()) * EARTH_RADIUS_M
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_uninitialised() {
        let proj = MapProjection::new();
        assert!(!proj.is_initialised());
        assert!(proj.project(47.0, 8.0).is_none());
        assert!(proj.reproject(1.0, 1.0).is_none());
        assert!(proj.reference().is_none());
    }

    #[test]
    fn test_anchor_projects_to_origin() {
        let proj = MapProjection::with_reference(47.397742, 8.545594, 10);
        let origin = proj.project(47.397742, 8.545594).unwrap();
        assert!(origin.norm() < 1e-3);
        assert_eq!(proj.reference_timestamp(), 10);
    }

    #[test]
    fn test_axes() {
        let proj = MapProjection::with_reference(47.0, 8.0, 0);

        // A thousandth of a degree north is roughly 111 m
        let north = proj.project(47.001, 8.0).unwrap();
        assert!((north[0] - 111.19).abs() < 0.5);
        assert!(north[1].abs() < 1e-3);

        let east = proj.project(47.0, 8.001).unwrap();
        assert!(east[0].abs() < 0.01);
        assert!((east[1] - 75.83).abs() < 0.5);
    }

    #[test]
    fn test_round_trip() {
        let proj = MapProjection::with_reference(-33.8688, 151.2093, 0);

        for (lat, lon) in [(-33.87, 151.21), (-33.86, 151.22), (-33.90, 151.18)].iter() {
            let local = proj.project(*lat, *lon).unwrap();
            let geo = proj.reproject(local[0] as f64, local[1] as f64).unwrap();
            assert!((geo[0] - lat).abs() < 1e-6);
            assert!((geo[1] - lon).abs() < 1e-6);
        }
    }

    #[test]
    fn test_projection_distance_matches_haversine() {
        let proj = MapProjection::with_reference(51.5, -0.12, 0);
        let a = Vector2::new(51.5, -0.12);
        let b = Vector2::new(51.51, -0.10);

        let local = proj.project_vec(&b).unwrap();
        assert!((local.norm() as f64 - distance_m(&a, &b)).abs() < 0.1);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut proj = MapProjection::new();
        assert!(!proj.init_reference(f64::NAN, 8.0, 0));
        assert!(!proj.init_reference(91.0, 8.0, 0));
        assert!(!proj.is_initialised());

        assert!(proj.init_reference(47.0, 8.0, 0));
        assert!(proj.project(f64::INFINITY, 8.0).is_none());
        assert!(proj.project(47.0, 181.0).is_none());
        assert!(proj.reproject(f64::NAN, 0.0).is_none());
    }
}
