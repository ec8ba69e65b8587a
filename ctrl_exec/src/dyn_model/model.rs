//! Mass, Coriolis and gravity terms of the two link limb

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix2, Vector2};
use serde::Serialize;

// Internal
use super::LimbModelParams;
use crate::joint_est::JointState;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Contributions to the torque required at one joint.
///
/// Units: newton meters
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TorqueBreakdown {
    /// `(M * ddq)_i`
    pub inertial_nm: f64,

    /// `(C * dq)_i`
    pub coriolis_nm: f64,

    /// `G_i`
    pub gravity_nm: f64,

    /// Sum of the three contributions.
    pub total_nm: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the torque breakdown at the hip and knee for the given joint
/// states.
///
/// This is a pure function of its inputs and may be called concurrently for
/// independent limbs.
pub fn compute_torque(
    hip: &JointState,
    knee: &JointState,
    params: &LimbModelParams,
) -> (TorqueBreakdown, TorqueBreakdown) {
    let m = mass_matrix(knee.angle_rad, params);
    let c = coriolis_matrix(knee.angle_rad, hip.velocity_rads, knee.velocity_rads, params);
    let g = gravity_vector(hip.angle_rad, knee.angle_rad, params);

    let acc = Vector2::new(hip.acceleration_radss, knee.acceleration_radss);
    let vel = Vector2::new(hip.velocity_rads, knee.velocity_rads);

    let inertial = m * acc;
    let coriolis = c * vel;

    (
        TorqueBreakdown::new(inertial[0], coriolis[0], g[0]),
        TorqueBreakdown::new(inertial[1], coriolis[1], g[1]),
    )
}

/// Mass matrix, which only depends on the knee angle `q2`.
pub fn mass_matrix(q2: f64, p: &LimbModelParams) -> Matrix2<f64> {
    let cos_q2 = q2.cos();

    let m00 = p.m1_kg * p.r1_m.powi(2)
        + p.i1_kgm2
        + p.m2_kg * (p.l1_m.powi(2) + p.r2_m.powi(2) + 2.0 * p.l1_m * p.r2_m * cos_q2);
    let m01 = p.m2_kg * (p.l1_m * p.r2_m * cos_q2 + p.r2_m.powi(2)) + p.i1_kgm2;
    let m11 = p.m2_kg * p.r2_m.powi(2) + p.i2_kgm2;

    Matrix2::new(
        m00, m01,
        m01, m11,
    )
}

/// Coriolis and centrifugal matrix.
pub fn coriolis_matrix(q2: f64, dq1: f64, dq2: f64, p: &LimbModelParams) -> Matrix2<f64> {
    let term = p.m2_kg * p.l1_m * p.r2_m * q2.sin();

    Matrix2::new(
        -term * dq2, -term * (dq1 + dq2),
        term * dq1,  0.0,
    )
}

/// Gravity vector.
pub fn gravity_vector(q1: f64, q2: f64, p: &LimbModelParams) -> Vector2<f64> {
    let sin_q12 = (q1 + q2).sin();

    Vector2::new(
        -p.m1_kg * p.g_ms2 * p.r1_m * q1.sin()
            - p.m2_kg * p.g_ms2 * (p.l1_m * q1.sin() + p.r2_m * sin_q12),
        -p.m2_kg * p.g_ms2 * p.r2_m * sin_q12,
    )
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TorqueBreakdown {
    pub fn new(inertial_nm: f64, coriolis_nm: f64, gravity_nm: f64) -> Self {
        Self {
            inertial_nm,
            coriolis_nm,
            gravity_nm,
            total_nm: inertial_nm + coriolis_nm + gravity_nm,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn js(angle_rad: f64, velocity_rads: f64, acceleration_radss: f64) -> JointState {
        JointState { angle_rad, velocity_rads, acceleration_radss }
    }

    #[test]
    fn test_deterministic() {
        let p = LimbModelParams::default();
        let hip = js(0.4, -1.3, 7.0);
        let knee = js(1.1, 2.2, -3.5);

        let first = compute_torque(&hip, &knee, &p);
        for _ in 0..10 {
            assert_eq!(compute_torque(&hip, &knee, &p), first);
        }
    }

    #[test]
    fn test_neutral_at_rest() {
        let p = LimbModelParams::default();
        let (h, k) = compute_torque(&js(0.0, 0.0, 0.0), &js(0.0, 0.0, 0.0), &p);

        assert_eq!(h, TorqueBreakdown::default());
        assert_eq!(k, TorqueBreakdown::default());
    }

    #[test]
    fn test_gravity_horizontal_thigh() {
        let p = LimbModelParams::default();

        // Thigh raised to horizontal, knee straight, held still
        let (h, k) = compute_torque(&js(FRAC_PI_2, 0.0, 0.0), &js(0.0, 0.0, 0.0), &p);

        let hip_g = -p.g_ms2 * (p.m1_kg * p.r1_m + p.m2_kg * (p.l1_m + p.r2_m));
        let knee_g = -p.m2_kg * p.g_ms2 * p.r2_m;

        assert!((h.gravity_nm - hip_g).abs() < EPS);
        assert!((k.gravity_nm - knee_g).abs() < EPS);
        assert_eq!(h.inertial_nm, 0.0);
        assert_eq!(h.coriolis_nm, 0.0);
        assert!((h.total_nm - hip_g).abs() < EPS);

        // Gravity opposes deflection on either side of neutral
        let (h_neg, _) = compute_torque(&js(-0.3, 0.0, 0.0), &js(0.0, 0.0, 0.0), &p);
        assert!(h_neg.gravity_nm > 0.0);
    }

    #[test]
    fn test_inertial_knee_acceleration() {
        let p = LimbModelParams::default();
        let q2 = 0.7;
        let ddq2 = 4.0;

        let (h, k) = compute_torque(&js(0.0, 0.0, 0.0), &js(q2, 0.0, ddq2), &p);
        let m = mass_matrix(q2, &p);

        assert!((h.inertial_nm - m[(0, 1)] * ddq2).abs() < EPS);
        assert!((k.inertial_nm - m[(1, 1)] * ddq2).abs() < EPS);
        assert_eq!(m[(0, 1)], m[(1, 0)]);
    }

    #[test]
    fn test_coriolis_knee_velocity_only() {
        let p = LimbModelParams::default();
        let q2 = 0.9;
        let dq2 = 3.0;

        let (h, k) = compute_torque(&js(0.0, 0.0, 0.0), &js(q2, dq2, 0.0), &p);
        let term = p.m2_kg * p.l1_m * p.r2_m * q2.sin();

        assert!((h.coriolis_nm - (-term * dq2 * dq2)).abs() < EPS);
        assert_eq!(k.coriolis_nm, 0.0);
    }

    #[test]
    fn test_total_is_sum() {
        let p = LimbModelParams::default();
        let (h, k) = compute_torque(&js(0.2, 1.0, -2.0), &js(0.8, -0.5, 3.0), &p);

        for b in [h, k].iter() {
            assert!((b.total_nm - (b.inertial_nm + b.coriolis_nm + b.gravity_nm)).abs() < EPS);
        }
    }
}
