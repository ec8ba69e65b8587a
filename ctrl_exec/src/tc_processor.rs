//! # Telecommand processor module
//!
//! Turns operator telecommands into mode requests for the control loop, or answers them from the
//! published mode status.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use ctrl_lib::{
    ctrl_loop::{ModeRequester, RequestError},
    mode_mgr::{ModeRequest, StatusError, StatusHandle},
};
use eqpt_if::tc::ModeTc;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub(crate) enum TcExecError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Status(#[from] StatusError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
pub(crate) fn exec(
    requester: &ModeRequester,
    status: &StatusHandle,
    tc: &ModeTc,
) -> Result<(), TcExecError> {
    debug!("Recieved {:?} command", tc);

    let request = match tc {
        ModeTc::Activate => ModeRequest::Activate,
        ModeTc::Idle => ModeRequest::Idle,
        ModeTc::Shutdown => ModeRequest::Shutdown,
        ModeTc::Status => {
            let s = status.get()?;
            match s.last_fault {
                Some(fault) => info!(
                    "Mode {} after {} transitions, last fault: {}",
                    s.mode, s.num_transitions, fault
                ),
                None => info!("Mode {} after {} transitions", s.mode, s.num_transitions),
            }
            return Ok(());
        }
    };

    requester.request(request)?;

    Ok(())
}
