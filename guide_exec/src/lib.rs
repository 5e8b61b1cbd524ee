//! # Guidance library.
//!
//! Guidance for a differential drive (skid steer) rover: given the rover's pose and the active
//! mission leg it produces a throttle and yaw rate command each cycle, deciding whether to pivot
//! in place or drive along the path.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Guidance module - mode machine, waypoint store and controllers
pub mod guidance;

/// Pure pursuit path tracking
pub mod pursuit;

/// Executive - drives guidance cyclically from injected providers
pub mod exec;

/// Simulation - kinematic rover and mission navigator for closed loop runs
pub mod sim;
