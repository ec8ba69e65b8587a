//! Implementations for the JointEstimator state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use eqpt_if::eqpt::angle::JointSample;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic state of a single joint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct JointState {
    /// Units: radians
    pub angle_rad: f64,

    /// Units: radians/second
    pub velocity_rads: f64,

    /// Units: radians/second^2
    pub acceleration_radss: f64,
}

/// Finite difference estimator for one joint.
#[derive(Clone, Debug)]
pub struct JointEstimator {
    /// Samples closer together than this are rejected.
    ///
    /// Units: seconds
    min_sample_interval_s: f64,

    prev_angle_rad: f64,
    prev_velocity_rads: f64,

    /// Timestamp of the last accepted sample, used by `update_sample`.
    prev_time_s: Option<f64>,

    /// The most recent estimate.
    state: JointState,

    primed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointEstimator {
    pub fn new(min_sample_interval_s: f64) -> Self {
        Self {
            min_sample_interval_s,
            prev_angle_rad: 0.0,
            prev_velocity_rads: 0.0,
            prev_time_s: None,
            state: JointState::default(),
            primed: false,
        }
    }

    /// Set the previous sample to a known angle at rest.
    pub fn prime(&mut self, angle_rad: f64) {
        self.prev_angle_rad = angle_rad;
        self.prev_velocity_rads = 0.0;
        self.state = JointState {
            angle_rad,
            velocity_rads: 0.0,
            acceleration_radss: 0.0,
        };
        self.primed = true;
    }

    /// Update the estimate with a new angle taken `dt_s` after the previous one.
    ///
    /// If `dt_s` is not greater than the minimum sample interval the sample is ignored and the
    /// previous estimate returned unchanged. The first accepted sample of an unprimed estimator
    /// primes it, giving zero velocity and acceleration.
    pub fn update(&mut self, angle_rad: f64, dt_s: f64) -> JointState {
        // Negated so that a NaN interval is rejected too
        if !(dt_s > self.min_sample_interval_s) {
            trace!("Rejected sample with dt = {} s", dt_s);
            return self.state;
        }

        if !self.primed {
            self.prime(angle_rad);
            return self.state;
        }

        let velocity_rads = (angle_rad - self.prev_angle_rad) / dt_s;
        let acceleration_radss = (velocity_rads - self.prev_velocity_rads) / dt_s;

        self.prev_angle_rad = angle_rad;
        self.prev_velocity_rads = velocity_rads;
        self.state = JointState {
            angle_rad,
            velocity_rads,
            acceleration_radss,
        };

        self.state
    }

    /// Update the estimate from a timestamped sample.
    ///
    /// The interval is measured from the last accepted sample, so a rejected sample does not
    /// shorten the next interval. The first sample after construction or `reset` primes the
    /// estimator with its angle.
    pub fn update_sample(&mut self, sample: &JointSample) -> JointState {
        match self.prev_time_s {
            None => {
                self.prime(sample.angle_rad);
                self.prev_time_s = Some(sample.time_s);
                self.state
            }
            Some(prev_time_s) => {
                let dt_s = sample.time_s - prev_time_s;
                if dt_s > self.min_sample_interval_s {
                    self.prev_time_s = Some(sample.time_s);
                }
                self.update(sample.angle_rad, dt_s)
            }
        }
    }

    /// Forget priming and sample timing.
    pub fn reset(&mut self) {
        *self = Self::new(self.min_sample_interval_s);
    }

    /// The most recent estimate.
    pub fn state(&self) -> JointState {
        self.state
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
