//! # Equipment interface crate.
//!
//! Provides the interfaces between the control core and the equipment around it: the angle
//! sources feeding it joint samples, the actuator boundary it commands, and the operator
//! telecommands which change its operating mode.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator telecommands
pub mod tc;

/// Angle source and actuator boundary definitions
pub mod eqpt;
