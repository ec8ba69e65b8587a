//! Parameters structure for the control loop

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

// Internal
use crate::dyn_model::LimbModelParams;
use crate::mode_mgr::SafetyThresholds;
use crate::safety_gov::ActuatorConfig;
use eqpt_if::eqpt::act::{ActId, JointId, LimbId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the whole control core, loaded once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtrlParams {

    // ---- TIMING ----

    /// Target period of one control tick.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Joint samples closer together than this are ignored by the estimators.
    ///
    /// Units: seconds
    pub min_sample_interval_s: f64,

    // ---- OUTPUT ----

    /// Fraction of the modelled torque the suit provides, in (0, 1].
    pub assist_rate: f64,

    // ---- SAFETY ----

    pub thresholds: SafetyThresholds,

    // ---- LIMBS ----

    pub limbs: Vec<LimbParams>,
}

/// Parameters of a single limb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbParams {
    pub limb: LimbId,
    pub model: LimbModelParams,
    pub hip: ActuatorConfig,
    pub knee: ActuatorConfig,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Inconsistencies found in a parameter set.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{0} must be strictly positive, found {1}")]
    NonPositive(String, f64),

    #[error("Invalid bound {0}: minimum {1} must be less than maximum {2}")]
    InvalidBound(String, f64, f64),

    #[error("Direction of {0} must be 1 or -1, found {1}")]
    InvalidDirection(ActId, i8),

    #[error("The assist rate must be in (0, 1], found {0}")]
    AssistRate(f64),

    #[error("The command limits must be positive, found max_command = {0} and max_command_delta = {1}")]
    CommandLimits(i16, i16),

    #[error("At least one limb must be configured")]
    NoLimbs,

    #[error("The {0:?} limb is configured more than once")]
    DuplicateLimb(LimbId),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlParams {
    /// Check every invariant of the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_positive("tick_period_s", self.tick_period_s)?;
        check_bound(
            "min_sample_interval_s/tick_period_s",
            self.min_sample_interval_s,
            self.tick_period_s,
        )?;

        if !(self.assist_rate > 0.0 && self.assist_rate <= 1.0) {
            return Err(ParamsError::AssistRate(self.assist_rate));
        }

        let th = &self.thresholds;
        check_bound("hip_angle_deg", th.hip_min_angle_deg, th.hip_max_angle_deg)?;
        check_bound("knee_angle_deg", th.knee_min_angle_deg, th.knee_max_angle_deg)?;
        check_bound("torque_nm", th.min_torque_nm, th.max_torque_nm)?;
        check_positive("idle_effort_threshold_nm", th.idle_effort_threshold_nm)?;
        check_positive("idle_timeout_s", th.idle_timeout_s)?;

        if th.max_command <= 0 || th.max_command_delta <= 0 {
            return Err(ParamsError::CommandLimits(th.max_command, th.max_command_delta));
        }

        if self.limbs.is_empty() {
            return Err(ParamsError::NoLimbs);
        }

        let mut seen = HashSet::new();
        for limb in self.limbs.iter() {
            if !seen.insert(limb.limb) {
                return Err(ParamsError::DuplicateLimb(limb.limb));
            }
            limb.validate()?;
        }

        Ok(())
    }

    /// Parameters of the given limb, if it is configured.
    pub fn limb(&self, limb: LimbId) -> Option<&LimbParams> {
        self.limbs.iter().find(|l| l.limb == limb)
    }
}

impl LimbParams {
    /// Limb with the default model and drive trains in the given mounting senses.
    pub fn new(limb: LimbId, hip_direction: i8, knee_direction: i8) -> Self {
        Self {
            limb,
            model: LimbModelParams::default(),
            hip: ActuatorConfig { direction: hip_direction, ..Default::default() },
            knee: ActuatorConfig { direction: knee_direction, ..Default::default() },
        }
    }

    pub fn actuator(&self, joint: JointId) -> &ActuatorConfig {
        match joint {
            JointId::Hip => &self.hip,
            JointId::Knee => &self.knee,
        }
    }

    fn validate(&self) -> Result<(), ParamsError> {
        for (name, value) in self.model.positive_fields().iter() {
            check_positive(&format!("{:?}.model.{}", self.limb, name), *value)?;
        }

        for joint in [JointId::Hip, JointId::Knee].iter() {
            let id = ActId::new(self.limb, *joint);
            let act = self.actuator(*joint);

            check_positive(&format!("{}.gear_ratio", id), act.gear_ratio)?;
            check_positive(&format!("{}.rated_torque_nm", id), act.rated_torque_nm)?;

            if act.direction != 1 && act.direction != -1 {
                return Err(ParamsError::InvalidDirection(id, act.direction));
            }
        }

        Ok(())
    }
}

impl Default for CtrlParams {
    fn default() -> Self {
        Self {
            tick_period_s: 0.1,
            min_sample_interval_s: crate::joint_est::DEFAULT_MIN_SAMPLE_INTERVAL_S,
            assist_rate: 0.65,
            thresholds: SafetyThresholds::default(),
            limbs: vec![
                LimbParams::new(LimbId::Left, -1, 1),
                LimbParams::new(LimbId::Right, 1, -1),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_positive(name: &str, value: f64) -> Result<(), ParamsError> {
    // Negated to catch NaN
    if !(value > 0.0) {
        return Err(ParamsError::NonPositive(name.into(), value));
    }
    Ok(())
}

fn check_bound(name: &str, min: f64, max: f64) -> Result<(), ParamsError> {
    if !(min < max) {
        return Err(ParamsError::InvalidBound(name.into(), min, max));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert_eq!(CtrlParams::default().validate(), Ok(()));
    }

    #[test]
    fn test_invalid() {
        let mut p = CtrlParams::default();
        p.thresholds.knee_max_angle_deg = -20.0;
        assert!(matches!(p.validate(), Err(ParamsError::InvalidBound(..))));

        let mut p = CtrlParams::default();
        p.thresholds.idle_timeout_s = 0.0;
        assert_eq!(
            p.validate(),
            Err(ParamsError::NonPositive("idle_timeout_s".into(), 0.0))
        );

        let mut p = CtrlParams::default();
        p.assist_rate = 1.5;
        assert_eq!(p.validate(), Err(ParamsError::AssistRate(1.5)));

        let mut p = CtrlParams::default();
        p.limbs[1].knee.direction = 0;
        assert_eq!(
            p.validate(),
            Err(ParamsError::InvalidDirection(ActId::new(LimbId::Right, JointId::Knee), 0))
        );

        let mut p = CtrlParams::default();
        p.limbs[0].model.m2_kg = -1.0;
        assert!(matches!(p.validate(), Err(ParamsError::NonPositive(..))));

        let mut p = CtrlParams::default();
        p.limbs[1].limb = LimbId::Left;
        assert_eq!(p.validate(), Err(ParamsError::DuplicateLimb(LimbId::Left)));

        let mut p = CtrlParams::default();
        p.limbs.clear();
        assert_eq!(p.validate(), Err(ParamsError::NoLimbs));

        let mut p = CtrlParams::default();
        p.thresholds.max_command_delta = 0;
        assert_eq!(p.validate(), Err(ParamsError::CommandLimits(1000, 0)));
    }

    #[test]
    fn test_shipped_params() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../params/ctrl_exec.toml");
        let p: CtrlParams = util::params::load_from_path(path).unwrap();

        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p, CtrlParams::default());
    }

    #[test]
    fn test_load_toml() {
        let toml_str = r#"
            tick_period_s = 0.05
            min_sample_interval_s = 0.015
            assist_rate = 0.5

            [thresholds]
            hip_min_angle_deg = -30.0
            hip_max_angle_deg = 120.0
            knee_min_angle_deg = -15.0
            knee_max_angle_deg = 130.0
            min_torque_nm = -100.0
            max_torque_nm = 100.0
            idle_effort_threshold_nm = 0.5
            idle_timeout_s = 5.0
            max_command = 800
            max_command_delta = 50

            [[limbs]]
            limb = "Right"

            [limbs.model]
            m1_kg = 5.65
            m2_kg = 3.48
            l1_m = 0.41
            l2_m = 0.4879
            r1_m = 0.17
            r2_m = 0.1892
            i1_kgm2 = 0.0648
            i2_kgm2 = 0.0107
            g_ms2 = 9.81

            [limbs.hip]
            gear_ratio = 31.0
            rated_torque_nm = 0.64
            direction = 1
            driven = false

            [limbs.knee]
            gear_ratio = 31.0
            rated_torque_nm = 0.64
            direction = -1
        "#;

        let p: CtrlParams = util::params::from_str(toml_str).unwrap();
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.limbs.len(), 1);
        assert!(!p.limbs[0].hip.driven);
        assert!(p.limbs[0].knee.driven);
        assert_eq!(p.limb(LimbId::Right).map(|l| l.knee.direction), Some(-1));
        assert!(p.limb(LimbId::Left).is_none());
    }
}
