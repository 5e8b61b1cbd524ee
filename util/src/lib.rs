//! Utility library for the differential rover guidance workspace

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod geo;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod session;
