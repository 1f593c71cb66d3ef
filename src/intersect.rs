//! Finding the points where two co-focal orbits cross.
//!
//! The search is radial: at a common in-plane longitude the two orbits'
//! radii either match or they don't, so a crossing is a root of the radius
//! difference as a function of true anomaly. The annulus test rejects
//! orbit pairs that cannot cross at all, and the two search brackets (one
//! per half of the orbit) each contain at most one root.
//!
//! Out-of-plane separation is ignored: two orbits with different planes
//! "cross" where their radii match along the common longitude, which is
//! what matters when hunting for encounter candidates whose inclinations
//! are small.

use std::sync::Arc;

use glam::DVec3;
use thiserror::Error;

use crate::body::{CelestialBody, StarSystem};
use crate::math::normalize_angle;
use crate::orbit::Orbit;
use crate::solvers::brents_method;

/// The tolerance, in radians of true anomaly, at which crossings are
/// resolved.
const CROSSING_TOLERANCE: f64 = 1e-5;

/// Brackets narrower than this collapse to a single point instead of
/// being searched.
const DEGENERATE_BRACKET: f64 = 1e-10;

/// An error from the intersection finder.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntersectError {
    /// The two orbits are around different bodies.
    #[error("orbits must share the same primary")]
    MismatchedPrimaries,
}

/// A point where two orbits cross.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    /// The true anomaly of the crossing on each orbit, in `[0, 2π)`, in
    /// the order the orbits were given.
    pub true_anomalies: [f64; 2],

    /// The crossing position on each orbit, relative to the shared
    /// primary.
    pub positions: [DVec3; 2],
}

/// Finds the points where orbits `a` and `b` cross.
///
/// Returns up to two crossings. Orbits whose radial ranges do not overlap
/// return no crossings; a pair of coincident radii (e.g. two identical
/// orbits touching at a single longitude of the search boundary) returns
/// a degenerate crossing at that point.
///
/// # Errors
/// Returns [`IntersectError::MismatchedPrimaries`] if the orbits are not
/// around the same body.
pub fn orbit_intersections(a: &Orbit, b: &Orbit) -> Result<Vec<Crossing>, IntersectError> {
    if !Arc::ptr_eq(a.primary(), b.primary()) {
        return Err(IntersectError::MismatchedPrimaries);
    }

    // Annulus test: the orbits can only cross where their radial ranges
    // overlap.
    let min_ap = a.apoapsis().min(b.apoapsis());
    let max_pe = a.periapsis().max(b.periapsis());
    if min_ap < max_pe {
        return Ok(Vec::new());
    }

    // In-plane longitude of periapsis of each orbit; a point at the same
    // longitude has true anomaly differing by `shift` between the two.
    let a_long_pe = normalize_angle(a.arg_pe() + a.long_asc_node());
    let b_long_pe = normalize_angle(b.arg_pe() + b.long_asc_node());
    let shift = a_long_pe - b_long_pe;

    let radius_difference = |true_anomaly: f64| {
        a.radius_at_true_anomaly(true_anomaly)
            - b.radius_at_true_anomaly(normalize_angle(true_anomaly + shift))
    };

    // The overlap annulus maps to one true-anomaly interval on each half
    // of orbit A; each holds at most one sign change.
    let ta_at_min_ap = a.true_anomaly_at_radius(min_ap);
    let ta_at_max_pe = a.true_anomaly_at_radius(max_pe);
    let brackets = [
        [ta_at_min_ap, ta_at_max_pe],
        [-ta_at_min_ap, -ta_at_max_pe],
    ];

    let mut crossings = Vec::new();
    for bracket in brackets {
        let root = if (bracket[0] - bracket[1]).abs() > DEGENERATE_BRACKET {
            match brents_method(bracket[0], bracket[1], CROSSING_TOLERANCE, radius_difference) {
                Ok(root) => root,
                // No sign change in this half; no crossing here.
                Err(_) => continue,
            }
        } else {
            bracket[0]
        };
        // Circular orbits have no defined anomaly-at-radius.
        if root.is_nan() {
            continue;
        }

        let b_anomaly = normalize_angle(root + shift);
        crossings.push(Crossing {
            true_anomalies: [normalize_angle(root), b_anomaly],
            positions: [
                a.position_at_true_anomaly(root),
                b.position_at_true_anomaly(b_anomaly),
            ],
        });
    }
    Ok(crossings)
}

impl StarSystem {
    /// Finds the crossings of `orbit` with the orbits of every body that
    /// directly orbits the same primary.
    ///
    /// Bodies with no crossings are omitted.
    pub fn find_crossings(&self, orbit: &Orbit) -> Vec<(Arc<CelestialBody>, Vec<Crossing>)> {
        self.children_of(orbit.primary())
            .filter_map(|body| {
                let sibling_orbit = body.orbit.as_ref()?;
                match orbit_intersections(orbit, sibling_orbit) {
                    Ok(crossings) if !crossings.is_empty() => {
                        Some((body.clone(), crossings))
                    }
                    _ => None,
                }
            })
            .collect()
    }
}
