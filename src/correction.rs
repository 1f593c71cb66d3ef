//! Single-impulse course corrections via Lambert's problem.
//!
//! A correction burn changes the craft's velocity at one instant so that
//! its new orbit passes through a target position at a chosen arrival
//! time. The connecting conic is found with the universal-variables
//! Lambert formulation (Bate, Mueller & White, ch. 5): the time of flight
//! is a monotonic function of the universal parameter `z`, so the solve is
//! a bracketed one-dimensional search, with the Stumpff functions covering
//! the elliptic, parabolic, and hyperbolic regimes in one expression.

use std::sync::Arc;

use glam::DVec3;
use thiserror::Error;

use crate::body::CelestialBody;
use crate::intersect::orbit_intersections;
use crate::math::angle_about;
use crate::orbit::{Orbit, OrbitError};

/// Convergence tolerance of the Lambert time-of-flight solve, in seconds.
const LAMBERT_TOLERANCE: f64 = 1e-8;

/// Iteration cap of the Lambert solve.
const LAMBERT_MAX_ITERS: u32 = 500;

/// An error from the course-correction solvers.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// The craft and target orbits are around different bodies.
    #[error("craft and target orbits must share the same primary")]
    MismatchedPrimaries,

    /// The arrival time does not come after the burn time.
    #[error("flight time must be positive (burn at {burn_time}, arrival at {arrival_time})")]
    NonPositiveFlightTime {
        /// The requested burn time, in seconds.
        burn_time: f64,
        /// The requested arrival time, in seconds.
        arrival_time: f64,
    },

    /// The Lambert solve did not converge, typically because the transfer
    /// geometry is degenerate (near-zero or near-π transfer angle).
    #[error("Lambert solve failed to converge")]
    NoConvergence,

    /// The craft orbit is hyperbolic, so burns cannot be phased by whole
    /// revolutions.
    #[error("craft orbit has no period")]
    NonPeriodic,

    /// The craft orbit never crosses the target orbit.
    #[error("craft orbit does not cross the target orbit")]
    NoCrossings,

    /// An orbit evaluation failed.
    #[error(transparent)]
    Orbit(#[from] OrbitError),
}

/// A solved correction burn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseCorrection {
    /// The velocity change to apply at the burn, in m/s.
    pub delta_v: DVec3,

    /// The magnitude of the velocity change, in m/s.
    pub delta_v_mag: f64,

    /// The craft's velocity just after the burn, in m/s.
    pub corrected_velocity: DVec3,

    /// When to burn, in seconds.
    pub burn_time: f64,

    /// When the corrected orbit reaches the target position, in seconds.
    pub arrival_time: f64,
}

/// Stumpff function `C(z)`.
fn stumpff_c(z: f64) -> f64 {
    if z > 1e-6 {
        (1.0 - z.sqrt().cos()) / z
    } else if z < -1e-6 {
        ((-z).sqrt().cosh() - 1.0) / -z
    } else {
        // Series limit at z = 0
        0.5 - z / 24.0 + z * z / 720.0
    }
}

/// Stumpff function `S(z)`.
fn stumpff_s(z: f64) -> f64 {
    if z > 1e-6 {
        let sqrt_z = z.sqrt();
        (sqrt_z - sqrt_z.sin()) / sqrt_z.powi(3)
    } else if z < -1e-6 {
        let sqrt_neg_z = (-z).sqrt();
        (sqrt_neg_z.sinh() - sqrt_neg_z) / sqrt_neg_z.powi(3)
    } else {
        1.0 / 6.0 - z / 120.0 + z * z / 5040.0
    }
}

/// Solves Lambert's problem for the departure velocity.
///
/// `transfer_angle` is the prograde angle from `r1` to `r2`, in
/// `(0, 2π)`; the solution sweeps that angle, never its complement.
fn lambert_departure_velocity(
    r1: DVec3,
    r2: DVec3,
    transfer_angle: f64,
    time_of_flight: f64,
    mu: f64,
) -> Result<DVec3, CorrectionError> {
    let r1_mag = r1.length();
    let r2_mag = r2.length();
    let cos_angle = transfer_angle.cos();
    if (1.0 - cos_angle).abs() < 1e-12 {
        return Err(CorrectionError::NoConvergence);
    }
    let a_coeff =
        transfer_angle.sin() * (r1_mag * r2_mag / (1.0 - cos_angle)).sqrt();
    if a_coeff.abs() < 1e-12 {
        return Err(CorrectionError::NoConvergence);
    }

    let y = |z: f64| {
        r1_mag + r2_mag + a_coeff * (z * stumpff_s(z) - 1.0) / stumpff_c(z).sqrt()
    };
    // Time-of-flight residual, monotonically increasing in z. Negative y
    // means z is below the feasible range, so it reads as "too slow".
    let residual = |z: f64| {
        let y_z = y(z);
        if y_z < 0.0 {
            return f64::NEG_INFINITY;
        }
        let c = stumpff_c(z);
        (y_z / c).powf(1.5) * stumpff_s(z) + a_coeff * y_z.sqrt()
            - mu.sqrt() * time_of_flight
    };

    // Bracket the root, then bisect. z is bounded above by (2π)² (one
    // full elliptic revolution); grow the lower end into the hyperbolic
    // range as needed.
    let mut z_hi = 4.0 * std::f64::consts::PI * std::f64::consts::PI;
    let mut z_lo = -z_hi;
    let mut expansions = 0;
    while residual(z_lo) > 0.0 {
        z_lo *= 2.0;
        expansions += 1;
        if expansions > 60 {
            return Err(CorrectionError::NoConvergence);
        }
    }
    if residual(z_hi) < 0.0 {
        return Err(CorrectionError::NoConvergence);
    }

    let mut z = 0.0;
    let mut converged = false;
    for _ in 0..LAMBERT_MAX_ITERS {
        z = 0.5 * (z_lo + z_hi);
        let f = residual(z);
        if f.abs() < LAMBERT_TOLERANCE {
            converged = true;
            break;
        }
        if f < 0.0 {
            z_lo = z;
        } else {
            z_hi = z;
        }
        if (z_hi - z_lo).abs() < f64::EPSILON * z_hi.abs().max(1.0) {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(CorrectionError::NoConvergence);
    }

    let y_z = y(z);
    if y_z < 0.0 {
        return Err(CorrectionError::NoConvergence);
    }
    // Lagrange coefficients give the departure velocity directly.
    let f_coeff = 1.0 - y_z / r1_mag;
    let g_coeff = a_coeff * (y_z / mu).sqrt();
    Ok((r2 - f_coeff * r1) / g_coeff)
}

/// Solves the single burn at `burn_time` that makes `craft` reach the
/// target orbit's position of `arrival_time`.
///
/// The transfer sweeps the prograde angle (measured about the craft's
/// orbit normal) from the craft's burn position to the target's arrival
/// position.
pub fn course_correction(
    craft: &Orbit,
    target: &Orbit,
    burn_time: f64,
    arrival_time: f64,
) -> Result<CourseCorrection, CorrectionError> {
    if !Arc::ptr_eq(craft.primary(), target.primary()) {
        return Err(CorrectionError::MismatchedPrimaries);
    }
    let time_of_flight = arrival_time - burn_time;
    if time_of_flight <= 0.0 {
        return Err(CorrectionError::NonPositiveFlightTime {
            burn_time,
            arrival_time,
        });
    }

    let burn_state = craft.state_vectors_at(burn_time)?;
    let arrival_position = target.position_at(arrival_time)?;

    let transfer_angle = angle_about(burn_state.position, arrival_position, craft.normal());
    let corrected_velocity = lambert_departure_velocity(
        burn_state.position,
        arrival_position,
        transfer_angle,
        time_of_flight,
        craft.gravitational_parameter(),
    )?;

    let delta_v = corrected_velocity - burn_state.velocity;
    Ok(CourseCorrection {
        delta_v,
        delta_v_mag: delta_v.length(),
        corrected_velocity,
        burn_time,
        arrival_time,
    })
}

/// Finds the cheaper of the correction burns that redirect `craft` to one
/// of its crossings with the target body's orbit.
///
/// The burn happens `revolutions` whole craft periods after
/// `reference_time` (the time the craft passes the target's orbit on its
/// current trajectory); each crossing's arrival is phased to the first
/// pass after the burn. Later burns cost less when the geometry drifts
/// favorably, which is why the caller scans `revolutions`.
pub fn cheapest_correction(
    craft: &Orbit,
    target: &Arc<CelestialBody>,
    reference_time: f64,
    revolutions: u32,
) -> Result<CourseCorrection, CorrectionError> {
    let target_orbit = target
        .orbit
        .as_ref()
        .ok_or_else(|| OrbitError::BodyWithoutOrbit(target.name.clone()))?;
    let period = craft.period().ok_or(CorrectionError::NonPeriodic)?;

    let crossings = orbit_intersections(craft, target_orbit)
        .map_err(|_| CorrectionError::MismatchedPrimaries)?;
    if crossings.is_empty() {
        return Err(CorrectionError::NoCrossings);
    }

    let phase = reference_time.rem_euclid(period);
    let burn_time = reference_time + period * f64::from(revolutions);

    let mut best: Option<CourseCorrection> = None;
    let mut last_error = None;
    for crossing in &crossings {
        let mut crossing_phase = craft.time_at_true_anomaly(crossing.true_anomalies[0])?;
        if crossing_phase < phase {
            crossing_phase += period;
        }
        let arrival_time = burn_time + (crossing_phase - phase);

        match course_correction(craft, target_orbit, burn_time, arrival_time) {
            Ok(burn) => {
                if best
                    .as_ref()
                    .map_or(true, |current| burn.delta_v_mag < current.delta_v_mag)
                {
                    best = Some(burn);
                }
            }
            Err(error) => last_error = Some(error),
        }
    }
    match best {
        Some(burn) => Ok(burn),
        None => Err(last_error.unwrap_or(CorrectionError::NoCrossings)),
    }
}
