//! Simulated actuator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};

use eqpt_if::eqpt::act::{ActId, ActuatorBoundary, ActuatorError, ActuatorFault};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Actuator which accepts commands while enabled and logs them.
#[derive(Debug, Clone)]
pub struct SimActuator {
    id: ActId,
    enabled: bool,
    last_command: i16,
    num_commands: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimActuator {
    pub fn new(id: ActId) -> Self {
        Self {
            id,
            enabled: false,
            last_command: 0,
            num_commands: 0,
        }
    }

    /// Simulated actuators for every actuator of the suit.
    pub fn all() -> Vec<(ActId, SimActuator)> {
        ActId::all().map(|id| (id, SimActuator::new(id))).collect()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_command(&self) -> i16 {
        self.last_command
    }

    pub fn num_commands(&self) -> u64 {
        self.num_commands
    }
}

impl ActuatorBoundary for SimActuator {
    fn enable(&mut self) -> Result<(), ActuatorError> {
        debug!("[SIM] {} enabled", self.id);
        self.enabled = true;
        Ok(())
    }

    fn set_target_command(&mut self, command: i16) -> Result<(), ActuatorError> {
        if !self.enabled {
            return Err(ActuatorError::NotReady);
        }

        trace!("[SIM] {} command {}", self.id, command);
        self.last_command = command;
        self.num_commands += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        if self.enabled {
            debug!("[SIM] {} stopped", self.id);
        }
        self.enabled = false;
        self.last_command = 0;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.enabled
    }

    fn fault_status(&self) -> Option<ActuatorFault> {
        None
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
