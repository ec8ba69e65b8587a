//! Parameters structure for a governed actuator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive train description of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Reduction between the motor and the joint.
    pub gear_ratio: f64,

    /// Rated torque of the motor, the torque a command of 1000 produces.
    ///
    /// Units: newton meters
    pub rated_torque_nm: f64,

    /// Mounting sense of the motor, either `1` or `-1`.
    pub direction: i8,

    /// If false the joint is still estimated and supervised but no command
    /// is ever sent to it.
    #[serde(default = "default_driven")]
    pub driven: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_driven() -> bool {
    true
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActuatorConfig {
    /// Torque per command unit at the joint, before the assist rate.
    ///
    /// Units: newton meters
    pub fn torque_per_unit_nm(&self) -> f64 {
        self.gear_ratio * self.rated_torque_nm / super::PERMILLE
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            gear_ratio: 31.0,
            rated_torque_nm: 0.64,
            direction: 1,
            driven: true,
        }
    }
}
