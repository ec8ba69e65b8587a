//! Output safety governor module
//!
//! The last stage before an actuator: converts a physical torque into the drive's command unit
//! (permille of rated torque), saturates it and limits how far it may move in one tick. Nothing
//! here can fail, out of range inputs are bounded and the bounding is reported.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc;
mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use calc::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of command units per unit of rated torque.
pub const PERMILLE: f64 = 1000.0;
