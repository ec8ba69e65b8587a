//! Joint kinematic estimation module
//!
//! Turns a stream of joint angle samples into velocity and acceleration estimates using first
//! order finite differences. No smoothing is applied here, noise rejection belongs to whatever
//! produces the angles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default minimum interval between two accepted samples.
///
/// Units: seconds
pub const DEFAULT_MIN_SAMPLE_INTERVAL_S: f64 = 0.015;
