//! Parameters structure for the limb dynamics model

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Physical constants of one limb. Segment 1 is the thigh, segment 2 the
/// shank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimbModelParams {

    // ---- MASSES ----

    /// Units: kilograms
    pub m1_kg: f64,

    /// Units: kilograms
    pub m2_kg: f64,

    // ---- GEOMETRY ----

    /// Length of the thigh, hip to knee.
    ///
    /// Units: meters
    pub l1_m: f64,

    /// Length of the shank, knee to ankle. Not used by the dynamics since
    /// the chain ends at the shank's centre of mass, kept for completeness of
    /// the limb description.
    ///
    /// Units: meters
    pub l2_m: f64,

    /// Distance from the hip to the thigh's centre of mass.
    ///
    /// Units: meters
    pub r1_m: f64,

    /// Distance from the knee to the shank's centre of mass.
    ///
    /// Units: meters
    pub r2_m: f64,

    // ---- INERTIA ----

    /// Moment of inertia of the thigh about its centre of mass.
    ///
    /// Units: kilogram meters^2
    pub i1_kgm2: f64,

    /// Moment of inertia of the shank about its centre of mass.
    ///
    /// Units: kilogram meters^2
    pub i2_kgm2: f64,

    /// Units: meters/second^2
    pub g_ms2: f64,
}

impl LimbModelParams {
    /// Names and values of every parameter which must be strictly positive.
    pub(crate) fn positive_fields(&self) -> [(&'static str, f64); 9] {
        [
            ("m1_kg", self.m1_kg),
            ("m2_kg", self.m2_kg),
            ("l1_m", self.l1_m),
            ("l2_m", self.l2_m),
            ("r1_m", self.r1_m),
            ("r2_m", self.r2_m),
            ("i1_kgm2", self.i1_kgm2),
            ("i2_kgm2", self.i2_kgm2),
            ("g_ms2", self.g_ms2),
        ]
    }
}

impl Default for LimbModelParams {
    /// Segment values of the adult test subject the suit was first fitted to.
    fn default() -> Self {
        Self {
            m1_kg: 5.65,
            m2_kg: 3.48,
            l1_m: 0.41,
            l2_m: 0.4879,
            r1_m: 0.17,
            r2_m: 0.1892,
            i1_kgm2: 0.0648,
            i2_kgm2: 0.0107,
            g_ms2: 9.81,
        }
    }
}
