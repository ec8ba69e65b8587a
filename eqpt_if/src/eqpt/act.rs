//! # Actuator Boundary
//!
//! Identification of the suit's actuators and the command/status contract the control core
//! issues to them. The command unit is the drive's native signed permille of rated torque.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const ALL_LIMBS: [LimbId; 2] = [LimbId::Left, LimbId::Right];

const ALL_JOINTS: [JointId; 2] = [JointId::Hip, JointId::Knee];

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Contract for a single actuator drive.
///
/// Implementations wrap whatever bus the drive sits on. Every call is expected to complete within
/// the control tick; an implementation which cannot meet that should report itself as not ready
/// rather than block.
pub trait ActuatorBoundary {
    /// Put the drive into torque mode with output enabled.
    fn enable(&mut self) -> Result<(), ActuatorError>;

    /// Set the target torque in permille of the drive's rated torque.
    fn set_target_command(&mut self, command: i16) -> Result<(), ActuatorError>;

    /// Disable drive output. Must be safe to call repeatedly.
    fn stop(&mut self) -> Result<(), ActuatorError>;

    /// True if the drive can accept a command right now.
    fn is_ready(&self) -> bool;

    /// The latched fault of the drive, if any.
    fn fault_status(&self) -> Option<ActuatorFault>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// ID of an independently driven actuator.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub struct ActId {
    pub limb: LimbId,
    pub joint: JointId,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Side of the suit.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum LimbId {
    Left,
    Right,
}

/// Joint within a limb.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum JointId {
    Hip,
    Knee,
}

/// Faults latched by an actuator drive.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum ActuatorFault {
    OverCurrent,
    OverTemperature,
    UnderVoltage,
    /// Any other drive-specific error code.
    Drive(u16),
}

/// Errors reported by an actuator boundary.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("The actuator is not connected")]
    NotConnected,

    #[error("The actuator is not ready to accept commands")]
    NotReady,

    #[error("The actuator has latched a fault: {0:?}")]
    Fault(ActuatorFault),

    #[error("Communication with the actuator failed: {0}")]
    Comms(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActId {
    pub const fn new(limb: LimbId, joint: JointId) -> Self {
        Self { limb, joint }
    }

    /// Every actuator position on the suit.
    pub fn all() -> impl Iterator<Item = ActId> {
        ALL_LIMBS
            .iter()
            .flat_map(|l| ALL_JOINTS.iter().map(move |j| ActId::new(*l, *j)))
    }
}

impl fmt::Display for ActId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.limb, self.joint)
    }
}
