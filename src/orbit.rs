//! Keplerian orbits and conversions between orbital elements, anomalies,
//! time, and Cartesian state vectors.
//!
//! Element-to-state conversions follow the standard formulation found in,
//! e.g., Curtis, "Orbital Mechanics for Engineering Students", ch. 4; the
//! state-to-element derivation follows the classical h/n/e-vector method
//! of the same text, with the degenerate planar and circular cases handled
//! explicitly.

use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use glam::{DMat3, DVec3};
use thiserror::Error;

use crate::body::CelestialBody;
use crate::math::{angle_about, normalize_angle};
use crate::solvers::{
    solve_keplers_equation_elliptic, solve_keplers_equation_hyperbolic, BracketError,
};

/// Below this eccentricity an orbit is treated as circular when deriving
/// elements from state vectors.
const CIRCULAR_THRESHOLD: f64 = 1e-9;

/// Eccentricities within this distance of 1 are rejected as parabolic.
const PARABOLIC_THRESHOLD: f64 = 1e-9;

/// An error that can occur when evaluating or constructing an orbit.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrbitError {
    /// The state vectors describe a parabolic trajectory, which has no
    /// finite semi-major axis and is not representable here.
    #[error("state vectors describe a (near-)parabolic trajectory with eccentricity {0}")]
    ParabolicUnsupported(f64),

    /// An operation needed the orbit of a celestial body, but the body
    /// does not orbit anything.
    #[error("body {0:?} has no orbit")]
    BodyWithoutOrbit(String),

    /// Kepler's equation failed to bracket a solution.
    #[error(transparent)]
    Bracket(#[from] BracketError),
}

/// How an orbit's position is pinned to the timeline.
///
/// Both variants fix the same degree of freedom. The mean anomaly at
/// epoch places the craft at `t = 0`; the time of periapsis passage names
/// the instant the craft passes periapsis instead, which is the natural
/// form for hyperbolic trajectories, where the mean anomaly never wraps.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeReference {
    /// The mean anomaly at `t = 0`, in radians.
    MeanAnomalyAtEpoch(f64),

    /// The time at which the craft passes periapsis, in seconds.
    TimeOfPeriapsisPassage(f64),
}

/// A position and velocity pair, in meters and meters per second, relative
/// to the orbited body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateVectors {
    /// The position relative to the primary, in meters.
    pub position: DVec3,

    /// The velocity relative to the primary, in meters per second.
    pub velocity: DVec3,
}

/// A Keplerian orbit around a [`CelestialBody`].
///
/// The orbit may be elliptic (`e < 1`) or hyperbolic (`e > 1`); parabolic
/// trajectories are not representable. For hyperbolic orbits the
/// semi-major axis is negative.
///
/// Angles are in radians, distances in meters, times in seconds. The
/// primary is held through an [`Arc`] and shared with whatever else
/// references the same body, so two orbits around the same primary can be
/// recognized by pointer identity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orbit {
    primary: Arc<CelestialBody>,
    semi_major_axis: f64,
    eccentricity: f64,
    inclination: f64,
    long_asc_node: f64,
    arg_pe: f64,
    time_ref: TimeReference,
}

impl Orbit {
    /// Creates an orbit from its classical orbital elements.
    ///
    /// `semi_major_axis` must be positive for an elliptic orbit and
    /// negative for a hyperbolic one; this is not checked.
    pub fn from_elements(
        primary: Arc<CelestialBody>,
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: f64,
        long_asc_node: f64,
        arg_pe: f64,
        time_ref: TimeReference,
    ) -> Orbit {
        Orbit {
            primary,
            semi_major_axis,
            eccentricity,
            inclination,
            long_asc_node,
            arg_pe,
            time_ref,
        }
    }

    /// Derives an orbit from a position and velocity observed at `time`.
    ///
    /// The resulting orbit reproduces the given state: evaluating it at
    /// `time` returns (up to floating-point error) the same position and
    /// velocity. Near-parabolic states are rejected.
    pub fn from_position_and_velocity(
        primary: Arc<CelestialBody>,
        position: DVec3,
        velocity: DVec3,
        time: f64,
    ) -> Result<Orbit, OrbitError> {
        let mu = primary.gravitational_parameter();
        let radius = position.length();
        let speed_sq = velocity.length_squared();

        let angular_momentum = position.cross(velocity);
        let h_dir = angular_momentum.normalize();
        let node_vector = DVec3::Z.cross(angular_momentum);

        let ecc_vector =
            ((speed_sq - mu / radius) * position - position.dot(velocity) * velocity) / mu;
        let eccentricity = ecc_vector.length();
        if (eccentricity - 1.0).abs() < PARABOLIC_THRESHOLD {
            return Err(OrbitError::ParabolicUnsupported(eccentricity));
        }

        let energy = 0.5 * speed_sq - mu / radius;
        let semi_major_axis = -mu / (2.0 * energy);

        let inclination = (angular_momentum.z / angular_momentum.length()).clamp(-1.0, 1.0).acos();

        // The node vector vanishes for equatorial orbits and the
        // eccentricity vector for circular ones; pick conventional zero
        // angles and a well-defined periapsis direction in those cases.
        let equatorial = inclination < CIRCULAR_THRESHOLD || inclination > PI - CIRCULAR_THRESHOLD;
        let circular = eccentricity < CIRCULAR_THRESHOLD;

        let long_asc_node = if equatorial {
            0.0
        } else {
            normalize_angle(node_vector.y.atan2(node_vector.x))
        };

        let arg_pe = if circular {
            0.0
        } else if equatorial {
            // With Ω = 0 the node line degenerates to the X axis; for a
            // retrograde equatorial orbit the in-plane angle runs
            // clockwise when seen from +Z.
            if inclination < PI / 2.0 {
                normalize_angle(ecc_vector.y.atan2(ecc_vector.x))
            } else {
                normalize_angle(-ecc_vector.y.atan2(ecc_vector.x))
            }
        } else {
            angle_about(node_vector, ecc_vector, h_dir)
        };

        // Reference direction the true anomaly is measured from.
        let pe_direction = if circular {
            if equatorial {
                DVec3::X
            } else {
                node_vector
            }
        } else {
            ecc_vector
        };
        let mut true_anomaly = angle_about(pe_direction, position, h_dir);
        if true_anomaly > PI {
            true_anomaly -= TAU;
        }

        let mut orbit = Orbit {
            primary,
            semi_major_axis,
            eccentricity,
            inclination,
            long_asc_node,
            arg_pe,
            time_ref: TimeReference::MeanAnomalyAtEpoch(0.0),
        };
        let mean_anomaly = orbit.mean_anomaly_at_true_anomaly(true_anomaly)?;
        orbit.time_ref =
            TimeReference::MeanAnomalyAtEpoch(mean_anomaly - orbit.mean_motion() * time);
        Ok(orbit)
    }

    /// Returns the body this orbit is around.
    pub fn primary(&self) -> &Arc<CelestialBody> {
        &self.primary
    }

    /// Returns the semi-major axis, in meters. Negative for hyperbolic
    /// orbits.
    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    /// Returns the eccentricity.
    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    /// Returns the inclination, in radians.
    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    /// Returns the longitude of the ascending node, in radians.
    pub fn long_asc_node(&self) -> f64 {
        self.long_asc_node
    }

    /// Returns the argument of periapsis, in radians.
    pub fn arg_pe(&self) -> f64 {
        self.arg_pe
    }

    /// Returns the orbit's time reference.
    pub fn time_reference(&self) -> TimeReference {
        self.time_ref
    }

    /// Returns the gravitational parameter of the primary, in m³ s⁻².
    pub fn gravitational_parameter(&self) -> f64 {
        self.primary.gravitational_parameter()
    }

    /// Returns the periapsis radius `a (1 - e)`, in meters.
    pub fn periapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Returns the apoapsis radius `a (1 + e)`, in meters.
    ///
    /// Negative for hyperbolic orbits, which have no apoapsis.
    pub fn apoapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    /// Returns the semi-latus rectum `a (1 - e²)`, in meters.
    pub fn semi_latus_rectum(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity * self.eccentricity)
    }

    /// Returns the mean motion `sqrt(μ / |a|³)`, in radians per second.
    pub fn mean_motion(&self) -> f64 {
        (self.gravitational_parameter() / self.semi_major_axis.abs().powi(3)).sqrt()
    }

    /// Returns the orbital period, in seconds, or `None` for a hyperbolic
    /// orbit.
    pub fn period(&self) -> Option<f64> {
        if self.eccentricity < 1.0 {
            Some(TAU / self.mean_motion())
        } else {
            None
        }
    }

    /// Returns the rotation from the perifocal frame (X toward periapsis,
    /// Z along the orbit normal) into the primary's inertial frame.
    ///
    /// This is the usual `Rz(Ω) Rx(i) Rz(ω)` composition.
    pub fn perifocal_matrix(&self) -> DMat3 {
        DMat3::from_rotation_z(self.long_asc_node)
            * DMat3::from_rotation_x(self.inclination)
            * DMat3::from_rotation_z(self.arg_pe)
    }

    /// Returns the unit normal of the orbital plane, oriented along the
    /// orbital angular momentum.
    pub fn normal(&self) -> DVec3 {
        self.perifocal_matrix() * DVec3::Z
    }

    /// Returns the mean anomaly at time `t`, in radians.
    ///
    /// Not normalized; it grows without bound as `t` does.
    pub fn mean_anomaly_at(&self, time: f64) -> f64 {
        match self.time_ref {
            TimeReference::MeanAnomalyAtEpoch(m0) => m0 + self.mean_motion() * time,
            TimeReference::TimeOfPeriapsisPassage(tp) => self.mean_motion() * (time - tp),
        }
    }

    /// Returns the true anomaly at time `t`, in radians.
    ///
    /// Solving Kepler's equation for the given mean anomaly gives the
    /// eccentric (or hyperbolic) anomaly, which converts to the true
    /// anomaly in closed form. Elliptic results lie in `(-π, π]` plus the
    /// whole turns carried by the mean anomaly; hyperbolic results lie in
    /// the open asymptote range.
    pub fn true_anomaly_at(&self, time: f64) -> Result<f64, OrbitError> {
        let mean_anomaly = self.mean_anomaly_at(time);
        let e = self.eccentricity;
        if (e - 1.0).abs() < PARABOLIC_THRESHOLD {
            return Err(OrbitError::ParabolicUnsupported(e));
        }
        if e < 1.0 {
            let ecc_anom = solve_keplers_equation_elliptic(e, mean_anomaly)?;
            Ok(2.0 * f64::atan2(
                (1.0 + e).sqrt() * (ecc_anom / 2.0).sin(),
                (1.0 - e).sqrt() * (ecc_anom / 2.0).cos(),
            ))
        } else {
            let hyp_anom = solve_keplers_equation_hyperbolic(e, mean_anomaly)?;
            Ok(2.0 * (((e + 1.0) / (e - 1.0)).sqrt() * (hyp_anom / 2.0).tanh()).atan())
        }
    }

    /// Returns the mean anomaly corresponding to the given true anomaly.
    ///
    /// Fails with [`OrbitError::ParabolicUnsupported`] for a
    /// (near-)parabolic orbit, where neither the elliptic nor the
    /// hyperbolic form of Kepler's equation applies.
    pub fn mean_anomaly_at_true_anomaly(&self, true_anomaly: f64) -> Result<f64, OrbitError> {
        let e = self.eccentricity;
        if (e - 1.0).abs() < PARABOLIC_THRESHOLD {
            return Err(OrbitError::ParabolicUnsupported(e));
        }
        if e < 1.0 {
            let ecc_anom = 2.0 * f64::atan2(
                (1.0 - e).sqrt() * (true_anomaly / 2.0).sin(),
                (1.0 + e).sqrt() * (true_anomaly / 2.0).cos(),
            );
            Ok(ecc_anom - e * ecc_anom.sin())
        } else {
            let hyp_anom =
                2.0 * (((e - 1.0) / (e + 1.0)).sqrt() * (true_anomaly / 2.0).tan()).atanh();
            Ok(e * hyp_anom.sinh() - hyp_anom)
        }
    }

    /// Returns a time at which the orbit reaches the given true anomaly.
    ///
    /// For an elliptic orbit pinned by its mean anomaly at epoch the
    /// returned time is the first one at or after `t = 0`, in
    /// `[0, period)`; pinned by a periapsis passage at `tp` it is the
    /// first one at or after that passage, in `[tp, tp + period)`. Any
    /// whole number of periods may be added for later passes. For a
    /// hyperbolic orbit the time is unique and may be negative.
    pub fn time_at_true_anomaly(&self, true_anomaly: f64) -> Result<f64, OrbitError> {
        let mean_anomaly = self.mean_anomaly_at_true_anomaly(true_anomaly)?;
        let n = self.mean_motion();
        Ok(match (self.period(), self.time_ref) {
            (Some(period), TimeReference::MeanAnomalyAtEpoch(m0)) => {
                ((mean_anomaly - m0) / n).rem_euclid(period)
            }
            (Some(_), TimeReference::TimeOfPeriapsisPassage(tp)) => {
                tp + normalize_angle(mean_anomaly) / n
            }
            (None, TimeReference::MeanAnomalyAtEpoch(m0)) => (mean_anomaly - m0) / n,
            (None, TimeReference::TimeOfPeriapsisPassage(tp)) => tp + mean_anomaly / n,
        })
    }

    /// Returns the orbital radius at the given true anomaly, in meters.
    pub fn radius_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        self.semi_latus_rectum() / (1.0 + self.eccentricity * true_anomaly.cos())
    }

    /// Returns the non-negative true anomaly at which the orbit reaches
    /// the given radius.
    ///
    /// The other solution is the negative of the returned value. Radii
    /// below periapsis saturate to `0` and radii above apoapsis to `π`
    /// rather than producing NaN.
    pub fn true_anomaly_at_radius(&self, radius: f64) -> f64 {
        let cos_ta = (self.semi_latus_rectum() - radius) / (self.eccentricity * radius);
        if cos_ta >= 1.0 {
            0.0
        } else if cos_ta <= -1.0 {
            PI
        } else {
            cos_ta.acos()
        }
    }

    /// Returns the position at the given true anomaly, relative to the
    /// primary, in meters.
    pub fn position_at_true_anomaly(&self, true_anomaly: f64) -> DVec3 {
        let radius = self.radius_at_true_anomaly(true_anomaly);
        self.perifocal_matrix()
            * DVec3::new(radius * true_anomaly.cos(), radius * true_anomaly.sin(), 0.0)
    }

    /// Returns the velocity at the given true anomaly, relative to the
    /// primary, in meters per second.
    pub fn velocity_at_true_anomaly(&self, true_anomaly: f64) -> DVec3 {
        let speed_factor = (self.gravitational_parameter() / self.semi_latus_rectum()).sqrt();
        self.perifocal_matrix()
            * DVec3::new(
                -speed_factor * true_anomaly.sin(),
                speed_factor * (self.eccentricity + true_anomaly.cos()),
                0.0,
            )
    }

    /// Returns the true anomaly of the given position, in `(-π, π]`.
    ///
    /// The position is projected onto the orbital plane; only its
    /// direction from the primary matters.
    pub fn true_anomaly_at_position(&self, position: DVec3) -> f64 {
        let pe_direction = self.perifocal_matrix() * DVec3::X;
        let mut true_anomaly = angle_about(pe_direction, position, self.normal());
        if true_anomaly > PI {
            true_anomaly -= TAU;
        }
        true_anomaly
    }

    /// Returns the position at time `t`, relative to the primary.
    pub fn position_at(&self, time: f64) -> Result<DVec3, OrbitError> {
        Ok(self.position_at_true_anomaly(self.true_anomaly_at(time)?))
    }

    /// Returns the velocity at time `t`, relative to the primary.
    pub fn velocity_at(&self, time: f64) -> Result<DVec3, OrbitError> {
        Ok(self.velocity_at_true_anomaly(self.true_anomaly_at(time)?))
    }

    /// Returns the position and velocity at time `t`.
    pub fn state_vectors_at(&self, time: f64) -> Result<StateVectors, OrbitError> {
        let true_anomaly = self.true_anomaly_at(time)?;
        Ok(StateVectors {
            position: self.position_at_true_anomaly(true_anomaly),
            velocity: self.velocity_at_true_anomaly(true_anomaly),
        })
    }

    /// Re-pins this orbit's timing so that it passes the given body's
    /// position at `crossing_time`.
    ///
    /// The orbit's geometry is unchanged; only the mean anomaly at epoch
    /// moves. Used after a flyby, where the outbound conic is derived from
    /// geometry alone and must then be placed on the mission timeline.
    pub fn snap_timing_to_encounter(
        &mut self,
        body: &Arc<CelestialBody>,
        crossing_time: f64,
    ) -> Result<(), OrbitError> {
        let body_orbit = body
            .orbit
            .as_ref()
            .ok_or_else(|| OrbitError::BodyWithoutOrbit(body.name.clone()))?;
        let body_position = body_orbit.position_at(crossing_time)?;
        let true_anomaly = self.true_anomaly_at_position(body_position);
        let crossing_t = self.time_at_true_anomaly(true_anomaly)?;
        let epoch_anomaly = self.mean_anomaly_at(crossing_t - crossing_time);
        self.time_ref = TimeReference::MeanAnomalyAtEpoch(epoch_anomaly);
        Ok(())
    }
}
