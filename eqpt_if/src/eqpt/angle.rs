//! # Angle Source
//!
//! Joint angle samples as supplied to the control core. The core does not care whether they come
//! from live inertial sensor fusion, a learned predictor or a replayed recording.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of limb samples, pulled once per control tick.
pub trait AngleSource {
    /// Get the next sample for the limb.
    ///
    /// Returns `Ok(None)` once the source is exhausted (for example at the end of a recording).
    fn next_sample(&mut self) -> Result<Option<LimbSample>, AngleSourceError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single joint angle measurement.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Copy, Clone)]
pub struct JointSample {
    /// Joint angle, 0 being the neutral (extended) pose of the joint.
    ///
    /// Units: radians
    pub angle_rad: f64,

    /// Time the angle was sampled at.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// The samples of both joints of a limb for one tick.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Copy, Clone)]
pub struct LimbSample {
    pub hip: JointSample,
    pub knee: JointSample,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by an angle source.
#[derive(Debug, Error)]
pub enum AngleSourceError {
    #[error("The angle source is disconnected")]
    Disconnected,

    #[error("The angle source produced invalid data: {0}")]
    InvalidData(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointSample {
    pub fn new(angle_rad: f64, time_s: f64) -> Self {
        Self { angle_rad, time_s }
    }
}

impl<S: AngleSource + ?Sized> AngleSource for Box<S> {
    fn next_sample(&mut self) -> Result<Option<LimbSample>, AngleSourceError> {
        (**self).next_sample()
    }
}
