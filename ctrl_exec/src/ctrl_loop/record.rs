//! Per tick diagnostic record

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::LimbOutput;
use crate::mode_mgr::OperatingMode;
use crate::safety_gov::GovernorReport;
use eqpt_if::eqpt::act::{JointId, LimbId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One limb's data for one tick, flat so that it can be archived as a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    pub time_s: f64,
    pub limb: LimbId,

    /// Mode at the end of the tick.
    pub mode: OperatingMode,

    pub hip_angle_rad: f64,
    pub hip_velocity_rads: f64,
    pub hip_acceleration_radss: f64,
    pub knee_angle_rad: f64,
    pub knee_velocity_rads: f64,
    pub knee_acceleration_radss: f64,

    pub hip_inertial_nm: f64,
    pub hip_coriolis_nm: f64,
    pub hip_gravity_nm: f64,
    pub hip_torque_nm: f64,
    pub knee_inertial_nm: f64,
    pub knee_coriolis_nm: f64,
    pub knee_gravity_nm: f64,
    pub knee_torque_nm: f64,

    /// Command handed to the actuator, `None` if nothing was emitted.
    pub hip_command: Option<i16>,
    pub knee_command: Option<i16>,

    pub hip_saturated: bool,
    pub hip_slew_limited: bool,
    pub knee_saturated: bool,
    pub knee_slew_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TickRecord {
    /// Record of a tick in which no command has (yet) been emitted.
    pub fn new(time_s: f64, limb: LimbId, mode: OperatingMode, out: &LimbOutput) -> Self {
        Self {
            time_s,
            limb,
            mode,
            hip_angle_rad: out.hip.angle_rad,
            hip_velocity_rads: out.hip.velocity_rads,
            hip_acceleration_radss: out.hip.acceleration_radss,
            knee_angle_rad: out.knee.angle_rad,
            knee_velocity_rads: out.knee.velocity_rads,
            knee_acceleration_radss: out.knee.acceleration_radss,
            hip_inertial_nm: out.hip_torque.inertial_nm,
            hip_coriolis_nm: out.hip_torque.coriolis_nm,
            hip_gravity_nm: out.hip_torque.gravity_nm,
            hip_torque_nm: out.hip_torque.total_nm,
            knee_inertial_nm: out.knee_torque.inertial_nm,
            knee_coriolis_nm: out.knee_torque.coriolis_nm,
            knee_gravity_nm: out.knee_torque.gravity_nm,
            knee_torque_nm: out.knee_torque.total_nm,
            hip_command: None,
            knee_command: None,
            hip_saturated: false,
            hip_slew_limited: false,
            knee_saturated: false,
            knee_slew_limited: false,
        }
    }

    /// Note the governor's result for a joint, and the command if it was emitted.
    pub fn set_governed(&mut self, joint: JointId, report: &GovernorReport, emitted: bool) {
        let command = if emitted { Some(report.command) } else { None };

        match joint {
            JointId::Hip => {
                self.hip_command = command;
                self.hip_saturated = report.saturated;
                self.hip_slew_limited = report.slew_limited;
            }
            JointId::Knee => {
                self.knee_command = command;
                self.knee_saturated = report.saturated;
                self.knee_slew_limited = report.slew_limited;
            }
        }
    }

    pub fn command(&self, joint: JointId) -> Option<i16> {
        match joint {
            JointId::Hip => self.hip_command,
            JointId::Knee => self.knee_command,
        }
    }
}
