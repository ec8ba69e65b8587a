//! Owner of the suit's actuator handles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, trace};

// Internal
use crate::mode_mgr::Fault;
use eqpt_if::eqpt::act::{ActId, ActuatorBoundary, ActuatorError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The driven actuators of the suit.
///
/// Every actuator is stopped when the set is dropped, whichever way the control loop exits.
pub struct ActuatorSet<A: ActuatorBoundary> {
    actuators: Vec<(ActId, A)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: ActuatorBoundary> ActuatorSet<A> {
    pub fn new(actuators: Vec<(ActId, A)>) -> Self {
        Self { actuators }
    }

    /// Enable every actuator.
    ///
    /// On the first failure all actuators are stopped again and the failure returned as a fault.
    pub fn enable_all(&mut self) -> Result<(), Fault> {
        let mut failure = None;

        for (id, act) in self.actuators.iter_mut() {
            if let Err(e) = act.enable() {
                failure = Some(Fault::ActuatorEnableFailed(*id, e.to_string()));
                break;
            }
        }

        match failure {
            Some(fault) => {
                self.stop_all();
                Err(fault)
            }
            None => {
                info!("{} actuators enabled", self.actuators.len());
                Ok(())
            }
        }
    }

    /// Stop every actuator, logging any which fail to stop.
    pub fn stop_all(&mut self) {
        for (id, act) in self.actuators.iter_mut() {
            if let Err(e) = act.stop() {
                error!("Could not stop {}: {}", id, e);
            }
        }
        trace!("All actuators stopped");
    }

    /// True if the actuator exists, is ready and has no latched fault.
    pub fn is_ready(&self, id: ActId) -> bool {
        match self.get(id) {
            Some(act) => act.is_ready() && act.fault_status().is_none(),
            None => false,
        }
    }

    /// Send a command to the actuator.
    pub fn emit(&mut self, id: ActId, command: i16) -> Result<(), ActuatorError> {
        match self.actuators.iter_mut().find(|(i, _)| *i == id) {
            Some((_, act)) => act.set_target_command(command),
            None => Err(ActuatorError::NotConnected),
        }
    }

    pub fn get(&self, id: ActId) -> Option<&A> {
        self.actuators.iter().find(|(i, _)| *i == id).map(|(_, a)| a)
    }

    pub fn ids(&self) -> impl Iterator<Item = ActId> + '_ {
        self.actuators.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }
}

impl<A: ActuatorBoundary> Drop for ActuatorSet<A> {
    fn drop(&mut self) {
        self.stop_all();
    }
}
