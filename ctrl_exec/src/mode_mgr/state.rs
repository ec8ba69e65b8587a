//! Implementations for the ModeMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, warn};
use serde::Serialize;
use std::sync::{Arc, RwLock};

// Internal
use super::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Owner of the current operating mode.
#[derive(Debug, Default)]
pub struct ModeMgr {
    mode: OperatingMode,

    /// Most recent fault, kept after re-arming for diagnostics.
    last_fault: Option<Fault>,

    num_transitions: u64,

    /// Copy of the above published after every transition.
    status: Arc<RwLock<ModeStatus>>,
}

/// Snapshot of the mode manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModeStatus {
    pub mode: OperatingMode,
    pub last_fault: Option<Fault>,
    pub num_transitions: u64,
}

/// Read only view of the mode manager's status, usable from any thread.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    status: Arc<RwLock<ModeStatus>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModeMgr {
    /// Create a new manager in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle an operator request.
    ///
    /// A shutdown request leaves `Active` for `Idle` before being returned to the caller, so the
    /// actuators are already stopped when the caller sees it.
    pub fn request<H: ModeHooks>(&mut self, request: ModeRequest, hooks: &mut H) -> RequestOutcome {
        let outcome = eval_request(self.mode, request);

        match outcome {
            RequestOutcome::Transition(to) => {
                self.transition(to, TransitionCause::Request(request), hooks)
            }
            RequestOutcome::Shutdown => {
                info!("Shutdown requested in {}", self.mode);
                if self.mode == OperatingMode::Active {
                    self.transition(OperatingMode::Idle, TransitionCause::Request(request), hooks);
                }
            }
            RequestOutcome::Ignored => {
                warn!("{:?} request ignored in {}", request, self.mode)
            }
        }

        outcome
    }

    /// Apply the tick's safety evaluation, returning the transition if one happened.
    pub fn evaluate<H: ModeHooks>(
        &mut self,
        eval: &TickEval,
        hooks: &mut H,
    ) -> Option<(OperatingMode, OperatingMode)> {
        let from = self.mode;

        match eval_tick(from, eval) {
            Some((to, cause)) => {
                self.transition(to, cause, hooks);
                Some((from, self.mode))
            }
            None => None,
        }
    }

    /// Move to `to`, running `leave` on the current mode and `enter` on the new one.
    ///
    /// If entering the new mode fails the manager immediately transitions on into `Error`.
    pub fn transition<H: ModeHooks>(
        &mut self,
        to: OperatingMode,
        cause: TransitionCause,
        hooks: &mut H,
    ) {
        let from = self.mode;

        hooks.leave(from, &cause);

        self.mode = to;
        self.num_transitions += 1;

        match &cause {
            TransitionCause::Fault(fault) => {
                error!("{} -> {}: {}", from, to, fault);
                self.last_fault = Some(fault.clone());
            }
            TransitionCause::Request(_) => info!("{} -> {} ({:?})", from, to, cause),
            _ => warn!("{} -> {} ({:?})", from, to, cause),
        }

        if let Err(fault) = hooks.enter(to, &cause) {
            if to == OperatingMode::Error {
                error!("Entering Error failed: {}", fault);
                self.last_fault = Some(fault);
            }
            else {
                self.transition(OperatingMode::Error, TransitionCause::Fault(fault), hooks);
            }
        }

        self.publish();
    }

    /// Get a handle for reading the status while the manager is owned elsewhere.
    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle {
            status: self.status.clone(),
        }
    }

    fn publish(&self) {
        match self.status.write() {
            Ok(mut status) => {
                *status = ModeStatus {
                    mode: self.mode,
                    last_fault: self.last_fault.clone(),
                    num_transitions: self.num_transitions,
                }
            }
            Err(_) => error!("Could not publish the mode status: {}", StatusError::Poisoned),
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn last_fault(&self) -> Option<&Fault> {
        self.last_fault.as_ref()
    }

    pub fn num_transitions(&self) -> u64 {
        self.num_transitions
    }
}

impl StatusHandle {
    /// The status as of the most recent transition.
    pub fn get(&self) -> Result<ModeStatus, StatusError> {
        self.status
            .read()
            .map(|s| s.clone())
            .map_err(|_| StatusError::Poisoned)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
