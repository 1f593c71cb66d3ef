//! # Patched-Conic Trajectory Engine
//! This library crate computes interplanetary trajectories in a simplified
//! patched-conic solar system, in the style of a game like Kerbal Space
//! Program.
//!
//! Everything here is closed-form two-body mechanics: orbits are Keplerian
//! conic sections, time and position are linked by Kepler's equation, and
//! a gravity assist is modeled as an instantaneous swap between the
//! heliocentric conic and a planet-centered hyperbola at the sphere of
//! influence. There is no numerical integration and no perturbation
//! modeling; identical inputs always produce identical outputs.
//!
//! ## Getting started
//! The main pieces are:
//! - [`Orbit`]: a Keplerian conic section about a [`CelestialBody`],
//!   convertible between true anomaly, time, and Cartesian state.
//! - [`solve_flyby`]: the patched-conic gravity-assist solver. Given an
//!   incoming transfer orbit, a target body, and a periapsis altitude, it
//!   produces the planet-frame [`Encounter`] geometry and the outbound
//!   heliocentric [`Orbit`].
//! - [`orbit_intersections`]: finds the true anomalies at which two
//!   co-focal orbits cross, used to hunt for follow-up encounters.
//! - [`course_correction`]: the single-impulse burn that redirects an
//!   orbit to hit a target's position at a given arrival time.
//! - [`StarSystem`] and [`body_presets`]: a catalog of celestial bodies
//!   with their parent/child relations, used to enumerate encounter
//!   candidates and to feed the solvers in tests and demos.
//!
//! ## Example
//!
//! ```rust
//! use patched_conics::{body_presets, Orbit, TimeReference};
//!
//! let system = body_presets::kerbol_system();
//! let kerbin = system.get("Kerbin").unwrap().clone();
//!
//! // A 100 km circular parking orbit above Kerbin.
//! let radius = kerbin.radius + 100_000.0;
//! let orbit = Orbit::from_elements(
//!     kerbin,
//!     radius,
//!     0.0,
//!     0.0,
//!     0.0,
//!     0.0,
//!     TimeReference::MeanAnomalyAtEpoch(0.0),
//! );
//!
//! let period = orbit.period().unwrap();
//! let p0 = orbit.position_at(0.0).unwrap();
//! let p1 = orbit.position_at(period).unwrap();
//! assert!((p0 - p1).length() < 1e-3);
//! ```

#![warn(missing_docs)]

mod body;
pub mod body_presets;
mod correction;
mod flyby;
mod intersect;
pub mod math;
mod orbit;
mod solvers;

pub use body::{CelestialBody, StarSystem};
pub use correction::{cheapest_correction, course_correction, CorrectionError, CourseCorrection};
pub use flyby::{solve_flyby, Encounter, Flyby, FlybyError};
pub use intersect::{orbit_intersections, Crossing, IntersectError};
pub use math::GeometryError;
pub use orbit::{Orbit, OrbitError, StateVectors, TimeReference};
pub use solvers::{brents_method, BracketError};

#[cfg(test)]
mod tests;
