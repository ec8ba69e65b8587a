//! Implementations for the AxisGovernor state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use super::{clamp, limit_slew, scale, ActuatorConfig};
use eqpt_if::eqpt::act::ActId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Governor for a single actuator.
#[derive(Debug, Clone)]
pub struct AxisGovernor {
    id: ActId,
    config: ActuatorConfig,
    assist_rate: f64,
    max_command: i16,
    max_delta: i16,

    /// The last command actually handed to the actuator.
    prev_command: i16,
}

/// Result of governing one torque demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GovernorReport {
    /// Scaled command before any bounding.
    pub raw_command: f64,

    /// Command after saturation.
    pub bounded_command: i16,

    /// Command after slew limiting, the one to emit.
    pub command: i16,

    pub saturated: bool,
    pub slew_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisGovernor {
    pub fn new(
        id: ActId,
        config: ActuatorConfig,
        assist_rate: f64,
        max_command: i16,
        max_delta: i16,
    ) -> Self {
        Self {
            id,
            config,
            assist_rate,
            max_command,
            max_delta,
            prev_command: 0,
        }
    }

    /// Compute the command for the given torque demand.
    ///
    /// The governor's memory is not changed, call `commit` once the command has been accepted
    /// by the actuator so that a suppressed command does not count as emitted.
    pub fn govern(&self, torque_nm: f64) -> GovernorReport {
        let raw_command = scale(torque_nm, &self.config, self.assist_rate);
        let (bounded_command, saturated) = clamp(raw_command, self.max_command);
        let (command, slew_limited) =
            limit_slew(bounded_command, self.prev_command, self.max_delta);

        if saturated {
            debug!("{} command saturated: raw {:.1} -> {}", self.id, raw_command, bounded_command);
        }
        if slew_limited {
            debug!(
                "{} command slew limited: {} -> {} (previous {})",
                self.id, bounded_command, command, self.prev_command
            );
        }

        GovernorReport {
            raw_command,
            bounded_command,
            command,
            saturated,
            slew_limited,
        }
    }

    /// Record a command as emitted.
    pub fn commit(&mut self, command: i16) {
        self.prev_command = command;
    }

    /// Return to the stopped state, as if 0 was last emitted.
    pub fn reset(&mut self) {
        self.prev_command = 0;
    }

    pub fn id(&self) -> ActId {
        self.id
    }

    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    pub fn prev_command(&self) -> i16 {
        self.prev_command
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use eqpt_if::eqpt::act::{JointId, LimbId};

    /// Governor where one newton meter maps onto exactly one command unit.
    fn unit_governor(max_command: i16, max_delta: i16) -> AxisGovernor {
        let config = ActuatorConfig {
            gear_ratio: 1000.0,
            rated_torque_nm: 1.0,
            direction: 1,
            driven: true,
        };

        AxisGovernor::new(
            ActId::new(LimbId::Right, JointId::Knee),
            config,
            1.0,
            max_command,
            max_delta,
        )
    }

    #[test]
    fn test_slew_from_previous() {
        let mut gov = unit_governor(3000, 50);
        gov.commit(200);

        let r = gov.govern(500.0);
        assert_eq!(r.bounded_command, 500);
        assert_eq!(r.command, 250);
        assert!(r.slew_limited);
        assert!(!r.saturated);

        // Not committed, so the same demand gives the same result
        assert_eq!(gov.govern(500.0), r);
        assert_eq!(gov.prev_command(), 200);
    }

    #[test]
    fn test_saturation() {
        let mut gov = unit_governor(3000, i16::MAX);
        let r = gov.govern(4000.0);
        assert_eq!(r.command, 3000);
        assert!(r.saturated);
        assert!(!r.slew_limited);

        gov.commit(r.command);
        let r = gov.govern(-4000.0);
        assert_eq!(r.command, -3000);
        assert!(r.saturated);
    }

    #[test]
    fn test_ramp_and_reset() {
        let mut gov = unit_governor(1000, 100);

        let mut commands = Vec::new();
        for _ in 0..5 {
            let r = gov.govern(1000.0);
            gov.commit(r.command);
            commands.push(r.command);
        }
        assert_eq!(commands, vec![100, 200, 300, 400, 500]);

        gov.reset();
        assert_eq!(gov.prev_command(), 0);
        assert_eq!(gov.govern(1000.0).command, 100);
    }

    #[test]
    fn test_nan_torque() {
        let mut gov = unit_governor(1000, 100);
        gov.commit(50);

        let r = gov.govern(f64::NAN);
        assert!(r.saturated);
        assert_eq!(r.bounded_command, 0);
        assert_eq!(r.command, 0);
    }
}
