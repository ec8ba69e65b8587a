//! Mode manager module
//!
//! Supervises the operating mode of the suit. Commands only reach the actuators in `Active`,
//! which is entered on operator request and left either on request, after a period of low
//! effort, or when a measured or computed value leaves its envelope.
//!
//! The decision rules are pure functions of the current mode and the tick's evaluation, the
//! side effects of a transition are delegated to a `ModeHooks` implementation.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::*;
pub use state::*;
use eqpt_if::eqpt::act::{ActId, LimbId};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Side effects run on each mode transition.
pub trait ModeHooks {
    /// Called with the mode being left, before the mode changes.
    fn leave(&mut self, mode: OperatingMode, cause: &TransitionCause);

    /// Called with the mode being entered, after the mode has changed.
    ///
    /// An error puts the suit into `Error` with the returned fault.
    fn enter(&mut self, mode: OperatingMode, cause: &TransitionCause) -> Result<(), Fault>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperatingMode {
    /// Output disabled, waiting for the operator.
    Idle,

    /// Assisting, commands are sent to the actuators.
    Active,

    /// Output disabled after a fault, waiting for the operator to re-arm.
    Error,
}

/// Mode change requested from outside the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModeRequest {
    Activate,
    Idle,
    Shutdown,
}

/// Safety faults which trip the suit into `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum Fault {
    #[error("{act} angle {angle_deg:.1} deg outside [{min_deg}, {max_deg}] deg")]
    AngleOutOfEnvelope {
        act: ActId,
        angle_deg: f64,
        min_deg: f64,
        max_deg: f64,
    },

    #[error("{act} torque {torque_nm:.2} Nm outside [{min_nm}, {max_nm}] Nm")]
    TorqueOutOfEnvelope {
        act: ActId,
        torque_nm: f64,
        min_nm: f64,
        max_nm: f64,
    },

    #[error("Could not enable {0}: {1}")]
    ActuatorEnableFailed(ActId, String),

    #[error("Angle source for the {0:?} limb failed: {1}")]
    AngleSourceFailed(LimbId, String),
}

/// Reason for a mode transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransitionCause {
    Request(ModeRequest),
    Fault(Fault),
    IdleTimeout,
    SourceExhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Mode status lock is poisoned")]
    Poisoned,
}

/// What to do with an operator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Transition(OperatingMode),
    Shutdown,
    Ignored,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Safety evaluation of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEval {
    /// First envelope violation found this tick.
    pub fault: Option<Fault>,

    /// True if effort has been low for longer than the idle timeout.
    pub idle_expired: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Decide the transition, if any, caused by a tick's evaluation.
///
/// Only `Active` reacts to ticks. A fault takes priority over the idle timeout.
pub fn eval_tick(
    mode: OperatingMode,
    eval: &TickEval,
) -> Option<(OperatingMode, TransitionCause)> {
    if mode != OperatingMode::Active {
        return None;
    }

    match (&eval.fault, eval.idle_expired) {
        (Some(fault), _) => Some((OperatingMode::Error, TransitionCause::Fault(fault.clone()))),
        (None, true) => Some((OperatingMode::Idle, TransitionCause::IdleTimeout)),
        (None, false) => None,
    }
}

/// Decide what an operator request does in the given mode.
pub fn eval_request(mode: OperatingMode, request: ModeRequest) -> RequestOutcome {
    use OperatingMode::*;

    match (mode, request) {
        (_, ModeRequest::Shutdown) => RequestOutcome::Shutdown,
        (Idle, ModeRequest::Activate) | (Error, ModeRequest::Activate) => {
            RequestOutcome::Transition(Active)
        }
        (Active, ModeRequest::Idle) | (Error, ModeRequest::Idle) => {
            RequestOutcome::Transition(Idle)
        }
        _ => RequestOutcome::Ignored,
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OperatingMode {
    fn default() -> Self {
        OperatingMode::Idle
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use eqpt_if::eqpt::act::JointId;

    fn angle_fault() -> Fault {
        Fault::AngleOutOfEnvelope {
            act: ActId::new(LimbId::Right, JointId::Knee),
            angle_deg: 140.0,
            min_deg: -15.0,
            max_deg: 130.0,
        }
    }

    #[test]
    fn test_eval_tick() {
        let quiet = TickEval::default();
        let idle = TickEval { fault: None, idle_expired: true };
        let both = TickEval { fault: Some(angle_fault()), idle_expired: true };

        assert_eq!(eval_tick(OperatingMode::Active, &quiet), None);
        assert_eq!(
            eval_tick(OperatingMode::Active, &idle),
            Some((OperatingMode::Idle, TransitionCause::IdleTimeout))
        );
        assert_eq!(
            eval_tick(OperatingMode::Active, &both),
            Some((OperatingMode::Error, TransitionCause::Fault(angle_fault())))
        );

        // Faults are edge triggered from Active only
        assert_eq!(eval_tick(OperatingMode::Error, &both), None);
        assert_eq!(eval_tick(OperatingMode::Idle, &both), None);
    }

    #[test]
    fn test_eval_request() {
        use OperatingMode::*;

        assert_eq!(eval_request(Idle, ModeRequest::Activate), RequestOutcome::Transition(Active));
        assert_eq!(eval_request(Error, ModeRequest::Activate), RequestOutcome::Transition(Active));
        assert_eq!(eval_request(Active, ModeRequest::Idle), RequestOutcome::Transition(Idle));
        assert_eq!(eval_request(Error, ModeRequest::Idle), RequestOutcome::Transition(Idle));
        assert_eq!(eval_request(Active, ModeRequest::Activate), RequestOutcome::Ignored);
        assert_eq!(eval_request(Idle, ModeRequest::Idle), RequestOutcome::Ignored);

        for mode in [Idle, Active, Error].iter() {
            assert_eq!(eval_request(*mode, ModeRequest::Shutdown), RequestOutcome::Shutdown);
        }
    }

    #[test]
    fn test_fault_display() {
        assert_eq!(
            angle_fault().to_string(),
            "RightKnee angle 140.0 deg outside [-15, 130] deg"
        );
    }
}
