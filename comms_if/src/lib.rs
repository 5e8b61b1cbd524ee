//! # Communications interface crate.
//!
//! Provides the data exchanged between guidance and the rest of the vehicle software: the
//! upstream navigation samples guidance consumes and the command and telemetry it produces.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Navigation samples (positions, mission state, setpoints) delivered to guidance
pub mod nav;

/// Telemetry and command outputs of guidance
pub mod tm;
