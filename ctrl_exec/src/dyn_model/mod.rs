//! Limb dynamics module
//!
//! Inverse dynamics of a two link serial chain (thigh and shank, jointed at the hip and knee),
//! giving the joint torques required to produce the estimated motion:
//!
//! ```text
//! tau = M(q2) * ddq + C(q2, dq) * dq + G(q)
//! ```
//!
//! Joint angles are zero with both segments hanging straight down, so the gravity term vanishes
//! in the standing pose and opposes any deflection from it. The total torque includes the gravity
//! contribution.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod model;
mod params;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use model::*;
pub use params::*;
