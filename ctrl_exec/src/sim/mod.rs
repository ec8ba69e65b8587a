//! Simulated equipment
//!
//! Stand-ins for the angle sources and actuators of the suit, used when running without
//! hardware and by the benchmarks.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod sim_act;
mod sine_src;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use sim_act::*;
pub use sine_src::*;
