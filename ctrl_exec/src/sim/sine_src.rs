//! Synthetic knee flexion angle source

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

// Internal
use eqpt_if::eqpt::angle::{AngleSource, AngleSourceError, JointSample, LimbSample};
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of a simulated gait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SineParams {
    /// Units: hertz
    pub freq_hz: f64,

    /// Peak knee flexion, reached half a period after starting straight.
    ///
    /// Units: degrees
    pub amplitude_deg: f64,

    /// Time between two samples.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// The source is exhausted after this time, runs forever if `None`.
    ///
    /// Units: seconds
    pub duration_s: Option<f64>,
}

/// Angle source flexing the knee between straight and `amplitude_deg` with the hip held at
/// neutral.
#[derive(Debug, Clone)]
pub struct SineAngleSource {
    params: SineParams,

    /// Index of the next sample.
    k: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SineAngleSource {
    pub fn new(params: SineParams) -> Self {
        Self { params, k: 0 }
    }

    /// Knee angle at the given time.
    ///
    /// Units: radians
    pub fn knee_angle_rad(&self, time_s: f64) -> f64 {
        let phase = TAU * self.params.freq_hz * time_s - FRAC_PI_2;
        lin_map((-1.0, 1.0), (0.0, self.params.amplitude_deg), phase.sin()).to_radians()
    }
}

impl AngleSource for SineAngleSource {
    fn next_sample(&mut self) -> Result<Option<LimbSample>, AngleSourceError> {
        // Multiplied rather than accumulated so the timestamps don't drift
        let time_s = self.k as f64 * self.params.dt_s;

        if let Some(duration_s) = self.params.duration_s {
            if time_s > duration_s {
                return Ok(None);
            }
        }

        self.k += 1;

        Ok(Some(LimbSample {
            hip: JointSample::new(0.0, time_s),
            knee: JointSample::new(self.knee_angle_rad(time_s), time_s),
        }))
    }
}

impl Default for SineParams {
    fn default() -> Self {
        Self {
            freq_hz: 1.0,
            amplitude_deg: 45.0,
            dt_s: 0.1,
            duration_s: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
