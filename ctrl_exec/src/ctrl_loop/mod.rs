//! Control loop module
//!
//! Runs the suit once per tick: pull a sample for every limb, estimate the joint kinematics,
//! compute the required torques, let the mode manager judge the tick and finally govern and emit
//! the actuator commands. Ticks are strictly sequential and nothing is emitted outside `Active`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod act_set;
mod limb;
mod params;
mod plant;
mod record;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use act_set::*;
pub use limb::*;
pub use params::*;
pub use record::*;
pub use state::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use serde::Serialize;
use std::sync::mpsc::Sender;

use crate::mode_mgr::{ModeRequest, OperatingMode};
use eqpt_if::eqpt::act::{ActId, LimbId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle through which other threads request mode changes.
///
/// Requests are queued and handled in order at the start of the next tick.
#[derive(Debug, Clone)]
pub struct ModeRequester {
    sender: Sender<ModeRequest>,
}

/// Counters kept over the life of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoopStats {
    pub num_ticks: u64,
    pub num_overruns: u64,
    pub num_commands: u64,
    pub num_suppressed: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not in `Active`, nothing was read or emitted.
    Suppressed(OperatingMode),

    /// Commands were handed to this many actuators.
    Emitted { num_commands: usize },

    /// The mode changed, no command was emitted.
    Transitioned { from: OperatingMode, to: OperatingMode },

    /// Shutdown was requested, all actuators are stopped.
    Shutdown,

    /// An angle source ran out of samples.
    SourceExhausted,
}

/// Why the loop stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopExit {
    Shutdown,
    SourceExhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum CtrlLoopError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("No angle source provided for the {0:?} limb")]
    MissingSource(LimbId),

    #[error("An angle source was provided for the unconfigured {0:?} limb")]
    UnusedSource(LimbId),

    #[error("No actuator provided for the driven joint {0}")]
    MissingActuator(ActId),

    #[error("An actuator was provided for {0}, which is not driven")]
    UnusedActuator(ActId),
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("The control loop is no longer running")]
    LoopStopped,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModeRequester {
    pub(crate) fn new(sender: Sender<ModeRequest>) -> Self {
        Self { sender }
    }

    /// Queue a request for the control loop.
    pub fn request(&self, request: ModeRequest) -> Result<(), RequestError> {
        self.sender
            .send(request)
            .map_err(|_| RequestError::LoopStopped)
    }

    /// Callback requesting shutdown, for use as a signal handler.
    ///
    /// The loop stops its actuators before exiting. Calls made after the loop has stopped are
    /// ignored.
    pub fn shutdown_handler(&self) -> impl FnMut() + Send + 'static {
        let requester = self.clone();

        move || {
            warn!("Interrupted, requesting shutdown");
            if requester.request(ModeRequest::Shutdown).is_err() {
                debug!("Control loop already stopped");
            }
        }
    }
}
