//! Bracketed scalar root finding and the Kepler's-equation solvers built
//! on top of it.
//!
//! The transcendental equations in this crate (Kepler's equation, the
//! radius-matching function of the intersection finder) are all solved
//! with Brent's method: a combination of bisection, the secant method,
//! and inverse quadratic interpolation that never leaves the caller's
//! bracket and converges at least as fast as bisection. See Brent,
//! "Algorithms for Minimization without Derivatives" (1973), chapter 4.

use std::f64::consts::{PI, TAU};
use thiserror::Error;

/// The maximum number of iterations for the numerical approach algorithms.
///
/// This is used to prevent infinite loops in case the method fails to converge.
const NUMERIC_MAX_ITERS: u32 = 100;

/// The tolerance used when solving Kepler's equation.
///
/// Anomalies round-trip through time to within roughly this angle.
pub(crate) const KEPLER_TOLERANCE: f64 = 1e-12;

/// An error produced when a root-finding bracket does not straddle a root.
///
/// Brent's method requires the function values at the two bracket
/// endpoints to have opposite signs; when they do not, no iteration is
/// performed and this error is returned. This is a caller error (a bad
/// bracket), not a numerical failure: given a valid bracket the method is
/// guaranteed to converge.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error(
    "bracket [{lo}, {hi}] does not straddle a root (f(lo) = {f_lo}, f(hi) = {f_hi})"
)]
pub struct BracketError {
    /// Lower end of the rejected bracket.
    pub lo: f64,
    /// Upper end of the rejected bracket.
    pub hi: f64,
    /// Function value at the lower end.
    pub f_lo: f64,
    /// Function value at the upper end.
    pub f_hi: f64,
}

/// Finds a root of `f` inside the bracket `[lo, hi]` using Brent's method.
///
/// The function values at `lo` and `hi` must have opposite signs;
/// otherwise a [`BracketError`] is returned without iterating. Given a
/// valid bracket, the method always terminates: an interpolated step that
/// would leave the bracket, or that fails to shrink the interval quickly
/// enough, is replaced by a bisection step.
///
/// # Example
/// ```
/// use patched_conics::brents_method;
///
/// let root = brents_method(1.0, 2.0, 1e-9, |x| x * x * x - x - 2.0).unwrap();
/// assert!((root - 1.5213797).abs() < 1e-6);
/// ```
pub fn brents_method<F>(lo: f64, hi: f64, tolerance: f64, f: F) -> Result<f64, BracketError>
where
    F: Fn(f64) -> f64,
{
    let mut a = lo;
    let mut b = hi;
    let mut fa = f(a);
    let mut fb = f(b);

    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if fa.signum() == fb.signum() {
        return Err(BracketError {
            lo,
            hi,
            f_lo: fa,
            f_hi: fb,
        });
    }

    // Keep |f(b)| <= |f(a)| so b is always the best current estimate.
    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut bisected = true;

    for _ in 0..NUMERIC_MAX_ITERS {
        if fb == 0.0 || (b - a).abs() < tolerance {
            break;
        }

        let mut s = if fa != fc && fb != fc {
            // Inverse quadratic interpolation
            a * fb * fc / ((fa - fb) * (fa - fc))
                + b * fa * fc / ((fb - fa) * (fb - fc))
                + c * fa * fb / ((fc - fa) * (fc - fb))
        } else {
            // Secant step
            b - fb * (b - a) / (fb - fa)
        };

        // Fall back to bisection whenever the interpolated step leaves the
        // safe region or shrinks the interval too slowly.
        let midpoint = 0.5 * (a + b);
        let out_of_range = (s - midpoint).signum() == (s - b).signum() && s != b
            || (s - a).abs() >= (b - a).abs()
            || (s - b).abs() >= (b - a).abs();
        let too_slow = if bisected {
            (s - b).abs() >= 0.5 * (b - c).abs() || (b - c).abs() < tolerance
        } else {
            (s - b).abs() >= 0.5 * (c - d).abs() || (c - d).abs() < tolerance
        };
        if out_of_range || too_slow {
            s = midpoint;
            bisected = true;
        } else {
            bisected = false;
        }

        let fs = f(s);
        d = c;
        c = b;
        fc = fb;

        if fa.signum() != fs.signum() {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }

        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }
    }

    Ok(b)
}

/// Solves Kepler's equation `M = E - e sin E` for the eccentric anomaly.
///
/// The mean anomaly is first reduced into `(-π, π]`, where the eccentric
/// anomaly is known to lie in `[-π, π]`; the removed whole turns are added
/// back to the solution. The bracket always straddles the root for
/// `0 <= e < 1`, so this cannot fail in practice, but the bracket error is
/// propagated rather than unwrapped.
pub(crate) fn solve_keplers_equation_elliptic(
    eccentricity: f64,
    mean_anomaly: f64,
) -> Result<f64, BracketError> {
    // Reduce into (-π, π]; E - e sin E is then bracketed by [-π, π].
    let mut reduced = mean_anomaly.rem_euclid(TAU);
    if reduced > PI {
        reduced -= TAU;
    }
    let turns = mean_anomaly - reduced;

    let root = brents_method(-PI, PI, KEPLER_TOLERANCE, |ecc_anom| {
        ecc_anom - eccentricity * ecc_anom.sin() - reduced
    })?;
    Ok(root + turns)
}

/// Solves the hyperbolic Kepler's equation `M = e sinh H - H` for the
/// hyperbolic anomaly.
///
/// The left-hand side is odd and strictly increasing, so the sign of the
/// solution matches the sign of the mean anomaly and the search runs on
/// the positive half-line. The upper end of the bracket starts at π and
/// doubles until the residual changes sign, which is guaranteed to happen
/// because `e sinh H - H` grows exponentially.
pub(crate) fn solve_keplers_equation_hyperbolic(
    eccentricity: f64,
    mean_anomaly: f64,
) -> Result<f64, BracketError> {
    let sign = if mean_anomaly < 0.0 { -1.0 } else { 1.0 };
    let magnitude = mean_anomaly.abs();

    let residual = |hyp_anom: f64| eccentricity * hyp_anom.sinh() - hyp_anom - magnitude;

    let mut hi = PI;
    for _ in 0..NUMERIC_MAX_ITERS {
        if residual(hi) >= 0.0 {
            break;
        }
        hi *= 2.0;
    }

    let root = brents_method(0.0, hi, KEPLER_TOLERANCE, residual)?;
    Ok(sign * root)
}
