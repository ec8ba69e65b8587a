//! Scaling, saturation and slew limiting of actuator commands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::ActuatorConfig;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a joint torque into an unbounded command for the actuator.
///
/// Units: torque_nm in newton meters, result in command units
pub fn scale(torque_nm: f64, config: &ActuatorConfig, assist_rate: f64) -> f64 {
    f64::from(config.direction) * torque_nm * assist_rate / config.torque_per_unit_nm()
}

/// Saturate a raw command into `[-max_command, max_command]`.
///
/// The fractional part is truncated towards zero first. A NaN command cannot be given a
/// meaningful bound so it becomes 0 and is reported as saturated.
pub fn clamp(raw: f64, max_command: i16) -> (i16, bool) {
    if raw.is_nan() {
        return (0, true);
    }

    let max = f64::from(max_command);
    let truncated = raw.trunc();
    let bounded = util::maths::clamp(truncated, -max, max);

    // Bounded value is integral and in i16 range so the cast is exact
    (bounded as i16, bounded != truncated)
}

/// Limit the change from the previous emitted command to at most `max_delta`.
pub fn limit_slew(bounded: i16, previous: i16, max_delta: i16) -> (i16, bool) {
    // Widened so the difference of two extreme commands can't overflow
    let delta = i32::from(bounded) - i32::from(previous);
    let max_delta = i32::from(max_delta);

    if delta > max_delta {
        ((i32::from(previous) + max_delta) as i16, true)
    }
    else if delta < -max_delta {
        ((i32::from(previous) - max_delta) as i16, true)
    }
    else {
        (bounded, false)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
