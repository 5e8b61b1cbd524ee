//! # Navigation samples
//!
//! Each sample carries the timestamp at which it was produced. Guidance treats every sample as
//! "latest or previous": a missing sample simply means nothing new arrived this cycle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod mission;
mod position;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use mission::*;
pub use position::*;
