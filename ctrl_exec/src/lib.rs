//! # Control library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the control crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control loop - ties the modules below together once per tick
pub mod ctrl_loop;

/// Dynamics model - torque required by the two link limb for the estimated motion
pub mod dyn_model;

/// Idle monitor - times how long the suit has been at rest
pub mod idle_mon;

/// Joint estimation - velocity and acceleration from sampled joint angles
pub mod joint_est;

/// Mode manager - the Idle/Active/Error supervisory state machine
pub mod mode_mgr;

/// Safety governor - torque to actuator command conversion with saturation and slew limits
pub mod safety_gov;

/// Simulated angle sources and actuators
pub mod sim;
