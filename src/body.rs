//! Celestial bodies and the star systems that contain them.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;

use crate::orbit::Orbit;

/// The universal gravitational constant, in m³ kg⁻¹ s⁻².
const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;

/// A celestial body: a star, planet, or moon.
///
/// Bodies are immutable once constructed and are shared between the orbits
/// that reference them through [`Arc`], so an orbit never owns its primary
/// and two orbits can cheaply be checked for sharing one.
///
/// All units are SI base units: kilograms, meters, seconds, radians.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CelestialBody {
    /// The name of the body, e.g., "Kerbin".
    pub name: String,

    /// The mass of the body, in kilograms.
    pub mass: f64,

    /// The equatorial radius of the body, in meters.
    pub radius: f64,

    /// The sidereal rotation period of the body, in seconds.
    pub sidereal_rotation_period: f64,

    /// The orbit of the body around its primary, if any.
    ///
    /// Stars at the root of a system have no orbit.
    pub orbit: Option<Orbit>,

    /// The standard gravitational parameter of the body (`G * mass`),
    /// in m³ s⁻².
    gravitational_parameter: f64,

    /// The radius of the body's sphere of influence, in meters, if the
    /// body orbits a primary.
    sphere_of_influence: Option<f64>,
}

impl CelestialBody {
    /// Creates a new celestial body.
    ///
    /// The gravitational parameter is derived from the mass, and the
    /// sphere-of-influence radius from the orbit (if any) using the
    /// `a * (m / M)^0.4` approximation, where `M` is the mass of the
    /// primary.
    pub fn new(
        name: impl Into<String>,
        mass: f64,
        radius: f64,
        sidereal_rotation_period: f64,
        orbit: Option<Orbit>,
    ) -> CelestialBody {
        let sphere_of_influence = orbit.as_ref().map(|orbit| {
            orbit.semi_major_axis() * (mass / orbit.primary().mass).powf(0.4)
        });
        CelestialBody {
            name: name.into(),
            mass,
            radius,
            sidereal_rotation_period,
            orbit,
            gravitational_parameter: GRAVITATIONAL_CONSTANT * mass,
            sphere_of_influence,
        }
    }

    /// Returns the standard gravitational parameter of the body
    /// (`G * mass`), in m³ s⁻².
    pub fn gravitational_parameter(&self) -> f64 {
        self.gravitational_parameter
    }

    /// Returns the radius of the body's sphere of influence, in meters.
    ///
    /// Returns `None` for a body with no orbit, whose influence is
    /// unbounded.
    pub fn sphere_of_influence(&self) -> Option<f64> {
        self.sphere_of_influence
    }

    /// Returns the speed of a circular orbit at the given altitude above
    /// the body's surface, in m/s.
    pub fn circular_orbit_velocity(&self, altitude: f64) -> f64 {
        (self.gravitational_parameter / (self.radius + altitude)).sqrt()
    }

    /// Returns the inertial angle of the given body-fixed longitude at the
    /// given time, in radians in `[0, 2π)`.
    ///
    /// At epoch, longitude zero points a quarter turn ahead of the
    /// reference direction.
    pub fn sidereal_time_at(&self, longitude: f64, time: f64) -> f64 {
        (TAU * time / self.sidereal_rotation_period + FRAC_PI_2 + longitude).rem_euclid(TAU)
    }
}

/// A collection of celestial bodies forming a single star system.
///
/// The system owns its bodies through [`Arc`]s; the same `Arc`s are held
/// by the orbits of the bodies' satellites, so parent-child relationships
/// can be resolved by pointer identity rather than by name.
#[derive(Clone, Debug, Default)]
pub struct StarSystem {
    bodies: Vec<Arc<CelestialBody>>,
}

impl StarSystem {
    /// Creates a star system from a list of bodies.
    pub fn new(bodies: Vec<Arc<CelestialBody>>) -> StarSystem {
        StarSystem { bodies }
    }

    /// Returns all bodies in the system.
    pub fn bodies(&self) -> &[Arc<CelestialBody>] {
        &self.bodies
    }

    /// Looks up a body by name.
    pub fn get(&self, name: &str) -> Option<&Arc<CelestialBody>> {
        self.bodies.iter().find(|body| body.name == name)
    }

    /// Returns the bodies that directly orbit the given body.
    ///
    /// The parent is matched by pointer identity, not by name.
    pub fn children_of<'a>(
        &'a self,
        parent: &'a Arc<CelestialBody>,
    ) -> impl Iterator<Item = &'a Arc<CelestialBody>> {
        self.bodies.iter().filter(move |body| {
            body.orbit
                .as_ref()
                .is_some_and(|orbit| Arc::ptr_eq(orbit.primary(), parent))
        })
    }
}
