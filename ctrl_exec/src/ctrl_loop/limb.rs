//! Per limb processing: estimation, dynamics and envelope checks

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::convert::Infallible;

// Internal
use super::{CtrlParams, LimbParams};
use crate::dyn_model::{compute_torque, LimbModelParams, TorqueBreakdown};
use crate::joint_est::{JointEstimator, JointState};
use crate::mode_mgr::{Fault, SafetyThresholds};
use crate::safety_gov::AxisGovernor;
use eqpt_if::eqpt::act::{ActId, JointId, LimbId};
use eqpt_if::eqpt::angle::LimbSample;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller of one limb, owning its estimators and governors.
#[derive(Debug, Clone)]
pub struct LimbCtrl {
    limb: LimbId,
    model: LimbModelParams,
    thresholds: SafetyThresholds,

    hip_est: JointEstimator,
    knee_est: JointEstimator,

    hip_gov: AxisGovernor,
    knee_gov: AxisGovernor,
}

/// Kinematics and torques of a limb for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LimbOutput {
    pub hip: JointState,
    pub knee: JointState,
    pub hip_torque: TorqueBreakdown,
    pub knee_torque: TorqueBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimbReport {
    /// First envelope violation of the limb, hip checked before knee.
    pub fault: Option<Fault>,

    /// True if both joints are below the idle effort threshold.
    pub low_effort: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LimbCtrl {
    pub fn new(limb_params: &LimbParams, params: &CtrlParams) -> Self {
        let limb = limb_params.limb;
        let th = &params.thresholds;

        let governor = |joint: JointId| {
            AxisGovernor::new(
                ActId::new(limb, joint),
                *limb_params.actuator(joint),
                params.assist_rate,
                th.max_command,
                th.max_command_delta,
            )
        };

        Self {
            limb,
            model: limb_params.model,
            thresholds: *th,
            hip_est: JointEstimator::new(params.min_sample_interval_s),
            knee_est: JointEstimator::new(params.min_sample_interval_s),
            hip_gov: governor(JointId::Hip),
            knee_gov: governor(JointId::Knee),
        }
    }

    pub fn limb(&self) -> LimbId {
        self.limb
    }

    pub fn governor(&self, joint: JointId) -> &AxisGovernor {
        match joint {
            JointId::Hip => &self.hip_gov,
            JointId::Knee => &self.knee_gov,
        }
    }

    pub fn governor_mut(&mut self, joint: JointId) -> &mut AxisGovernor {
        match joint {
            JointId::Hip => &mut self.hip_gov,
            JointId::Knee => &mut self.knee_gov,
        }
    }

    /// Forget the previously emitted commands.
    pub fn reset_governors(&mut self) {
        self.hip_gov.reset();
        self.knee_gov.reset();
    }
}

impl State for LimbCtrl {
    type InputData = LimbSample;
    type OutputData = LimbOutput;
    type StatusReport = LimbReport;
    type ProcError = Infallible;

    fn proc(&mut self, sample: &LimbSample) -> Result<(LimbOutput, LimbReport), Infallible> {
        let hip = self.hip_est.update_sample(&sample.hip);
        let knee = self.knee_est.update_sample(&sample.knee);

        let (hip_torque, knee_torque) = compute_torque(&hip, &knee, &self.model);

        trace!(
            "{:?} limb: hip {:.3} rad {:.3} Nm, knee {:.3} rad {:.3} Nm",
            self.limb, hip.angle_rad, hip_torque.total_nm, knee.angle_rad, knee_torque.total_nm
        );

        let fault = self
            .thresholds
            .check_envelope(ActId::new(self.limb, JointId::Hip), hip.angle_rad, hip_torque.total_nm)
            .and_then(|_| {
                self.thresholds.check_envelope(
                    ActId::new(self.limb, JointId::Knee),
                    knee.angle_rad,
                    knee_torque.total_nm,
                )
            })
            .err();

        let low_effort = self.thresholds.is_low_effort(hip_torque.total_nm)
            && self.thresholds.is_low_effort(knee_torque.total_nm);

        Ok((
            LimbOutput { hip, knee, hip_torque, knee_torque },
            LimbReport { fault, low_effort },
        ))
    }

    fn reset(&mut self) {
        self.hip_est.reset();
        self.knee_est.reset();
        self.reset_governors();
    }
}

impl LimbOutput {
    pub fn torque(&self, joint: JointId) -> &TorqueBreakdown {
        match joint {
            JointId::Hip => &self.hip_torque,
            JointId::Knee => &self.knee_torque,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
