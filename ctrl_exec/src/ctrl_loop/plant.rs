//! Mode transition side effects on the limbs and actuators

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::{ActuatorSet, LimbCtrl};
use crate::idle_mon::IdleMonitor;
use crate::mode_mgr::{Fault, ModeHooks, OperatingMode, TransitionCause};
use eqpt_if::eqpt::act::ActuatorBoundary;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything a mode transition acts upon.
pub(crate) struct Plant<A: ActuatorBoundary> {
    pub(crate) limbs: Vec<LimbCtrl>,
    pub(crate) actuators: ActuatorSet<A>,
    pub(crate) idle_mon: IdleMonitor,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A: ActuatorBoundary> ModeHooks for Plant<A> {
    fn leave(&mut self, mode: OperatingMode, _cause: &TransitionCause) {
        if mode == OperatingMode::Active {
            self.actuators.stop_all();
            for limb in self.limbs.iter_mut() {
                limb.reset_governors();
            }
        }
    }

    fn enter(&mut self, mode: OperatingMode, _cause: &TransitionCause) -> Result<(), Fault> {
        match mode {
            OperatingMode::Active => {
                for limb in self.limbs.iter_mut() {
                    limb.reset();
                }
                self.idle_mon.reset();
                self.actuators.enable_all()
            }
            _ => {
                debug!("Output disabled in {}", mode);
                Ok(())
            }
        }
    }
}
