//! Safety thresholds used by the mode manager

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Fault;
use eqpt_if::eqpt::act::{ActId, JointId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Envelopes and limits supervising the suit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyThresholds {

    // ---- ANGLE ENVELOPE ----

    /// Units: degrees
    pub hip_min_angle_deg: f64,

    /// Units: degrees
    pub hip_max_angle_deg: f64,

    /// Units: degrees
    pub knee_min_angle_deg: f64,

    /// Units: degrees
    pub knee_max_angle_deg: f64,

    // ---- TORQUE ENVELOPE ----

    /// Lowest admissible total joint torque.
    ///
    /// Units: newton meters
    pub min_torque_nm: f64,

    /// Highest admissible total joint torque.
    ///
    /// Units: newton meters
    pub max_torque_nm: f64,

    // ---- IDLE DETECTION ----

    /// Joints demanding less than this (in magnitude) are considered at rest.
    ///
    /// Units: newton meters
    pub idle_effort_threshold_nm: f64,

    /// How long every joint must be at rest before falling back to idle.
    ///
    /// Units: seconds
    pub idle_timeout_s: f64,

    // ---- OUTPUT ----

    /// Saturation bound of actuator commands.
    ///
    /// Units: permille of rated torque
    pub max_command: i16,

    /// Largest change of an actuator command in one tick.
    ///
    /// Units: permille of rated torque
    pub max_command_delta: i16,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SafetyThresholds {
    /// Angle envelope of a joint in degrees.
    pub fn angle_envelope_deg(&self, joint: JointId) -> (f64, f64) {
        match joint {
            JointId::Hip => (self.hip_min_angle_deg, self.hip_max_angle_deg),
            JointId::Knee => (self.knee_min_angle_deg, self.knee_max_angle_deg),
        }
    }

    /// Check a joint's angle and total torque against their envelopes.
    ///
    /// The angle is checked first. NaN values are outside every envelope.
    pub fn check_envelope(&self, act: ActId, angle_rad: f64, torque_nm: f64) -> Result<(), Fault> {
        let (min_deg, max_deg) = self.angle_envelope_deg(act.joint);
        let angle_deg = angle_rad.to_degrees();

        if !(angle_deg >= min_deg && angle_deg <= max_deg) {
            return Err(Fault::AngleOutOfEnvelope {
                act,
                angle_deg,
                min_deg,
                max_deg,
            });
        }

        if !(torque_nm >= self.min_torque_nm && torque_nm <= self.max_torque_nm) {
            return Err(Fault::TorqueOutOfEnvelope {
                act,
                torque_nm,
                min_nm: self.min_torque_nm,
                max_nm: self.max_torque_nm,
            });
        }

        Ok(())
    }

    /// True if the torque is below the idle effort threshold.
    pub fn is_low_effort(&self, torque_nm: f64) -> bool {
        torque_nm.abs() < self.idle_effort_threshold_nm
    }
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            hip_min_angle_deg: -30.0,
            hip_max_angle_deg: 120.0,
            knee_min_angle_deg: -15.0,
            knee_max_angle_deg: 130.0,
            min_torque_nm: -1000.0,
            max_torque_nm: 1000.0,
            idle_effort_threshold_nm: 0.5,
            idle_timeout_s: 5.0,
            max_command: 1000,
            max_command_delta: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
