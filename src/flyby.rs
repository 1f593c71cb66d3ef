//! The patched-conic gravity-assist solver.
//!
//! A flyby is modeled in three patches: the incoming heliocentric conic up
//! to the sphere of influence, a planet-centered hyperbola inside it, and
//! the outgoing heliocentric conic after the turn. Velocities are swapped
//! between frames instantaneously at the encounter; the encounter geometry
//! itself is solved in two dimensions after rotating the craft and planet
//! velocities into a common plane.
//!
//! The hyperbola is sized from the requested periapsis rather than from an
//! observed miss distance: given the excess speed and the periapsis
//! radius, the semi-major axis, eccentricity, impact parameter, and the
//! miss distance that would produce that periapsis all follow in closed
//! form (Curtis, eqs. 5.40-5.49, adapted to target periapsis).

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{DMat3, DVec2, DVec3};
use thiserror::Error;

use crate::body::CelestialBody;
use crate::math::{
    angle_about, intersection_directed_ray_circle, intersection_of_lines, rotate_z, rotation_to_xy_plane,
    GeometryError,
};
use crate::orbit::{Orbit, OrbitError};

/// An error that can occur when solving a flyby.
#[derive(Debug, Error)]
pub enum FlybyError {
    /// The craft's speed relative to the body is too low to form a
    /// hyperbola with the requested periapsis.
    #[error(
        "approach speed {speed} m/s at periapsis radius {periapsis} m does not \
         produce a hyperbolic trajectory"
    )]
    NonHyperbolicApproach {
        /// The speed relative to the body, in m/s.
        speed: f64,
        /// The requested periapsis radius, in meters.
        periapsis: f64,
    },

    /// The flyby body does not orbit anything.
    #[error("flyby body {0:?} has no orbit")]
    BodyWithoutOrbit(String),

    /// An orbit evaluation failed.
    #[error(transparent)]
    Orbit(#[from] OrbitError),

    /// The encounter geometry degenerated.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// The planet-frame geometry of a single gravity assist.
///
/// The "flattened" vectors live in the 2D encounter frame: the frame
/// rotated so both the craft's and the body's heliocentric velocities lie
/// in the XY plane with the body's velocity along +X.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    /// The craft's heliocentric velocity on approach, in m/s.
    pub approach_velocity: DVec3,

    /// The body's heliocentric velocity at the encounter, in m/s.
    pub body_velocity: DVec3,

    /// The craft's heliocentric velocity after the assist, in m/s.
    pub departure_velocity: DVec3,

    /// The craft's approach velocity in the encounter frame.
    pub flattened_craft_velocity: DVec3,

    /// The body's velocity in the encounter frame (along +X).
    pub flattened_body_velocity: DVec3,

    /// The craft's velocity relative to the body in the encounter frame.
    pub relative_velocity: DVec3,

    /// The craft's body-relative velocity after the turn, in the
    /// encounter frame.
    pub ejection_velocity: DVec3,

    /// The direction of the relative velocity in the encounter frame, in
    /// radians.
    pub intercept_angle: f64,

    /// The offset, along the body's velocity axis, at which the incoming
    /// asymptote crosses it, in meters. Signed: positive passes ahead of
    /// the body.
    pub miss_distance: f64,

    /// The perpendicular distance from the body to the incoming
    /// asymptote, in meters. Carries the same sign convention as the miss
    /// distance.
    pub impact_parameter: f64,

    /// The angle the hyperbola bends the relative velocity through, in
    /// radians. Always positive.
    pub turning_angle: f64,

    /// The direction of the outgoing relative velocity in the encounter
    /// frame, in radians.
    pub ejection_angle: f64,

    /// The periapsis position of the hyperbola in the encounter frame, in
    /// meters from the body.
    pub periapsis_position: DVec3,

    /// The craft's velocity at periapsis in the encounter frame, in m/s.
    pub periapsis_velocity: DVec3,

    /// Where the incoming asymptote crosses the sphere of influence, in
    /// the encounter frame.
    pub soi_entry: DVec2,

    /// Where the outgoing asymptote crosses the sphere of influence, in
    /// the encounter frame.
    pub soi_exit: DVec2,
}

/// A solved gravity assist.
#[derive(Debug, Clone, PartialEq)]
pub struct Flyby {
    /// The encounter geometry in the body's frame.
    pub encounter: Encounter,

    /// The hyperbolic orbit around the flyby body, in the encounter
    /// frame.
    pub hyperbola: Orbit,

    /// The heliocentric orbit the craft departs on. Passes through the
    /// body's position at the approach time.
    pub outbound: Orbit,
}

/// Solves the gravity assist of a craft on `transfer` past `body`,
/// reaching the body's position at `approach_time` and passing it at
/// `periapsis_altitude` meters above its surface.
///
/// `crossing_ahead` selects which side of the body the craft passes:
/// `true` crosses the body's orbit ahead of it, `false` behind. The two
/// choices bend the trajectory in opposite directions.
pub fn solve_flyby(
    transfer: &Orbit,
    body: &Arc<CelestialBody>,
    approach_time: f64,
    periapsis_altitude: f64,
    crossing_ahead: bool,
) -> Result<Flyby, FlybyError> {
    let body_orbit = body
        .orbit
        .as_ref()
        .ok_or_else(|| FlybyError::BodyWithoutOrbit(body.name.clone()))?;
    let soi = body
        .sphere_of_influence()
        .ok_or_else(|| FlybyError::BodyWithoutOrbit(body.name.clone()))?;
    let mu = body.gravitational_parameter();

    let body_position = body_orbit.position_at(approach_time)?;
    let approach_velocity =
        transfer.velocity_at_true_anomaly(transfer.true_anomaly_at_position(body_position));
    let body_velocity =
        body_orbit.velocity_at_true_anomaly(body_orbit.true_anomaly_at_position(body_position));

    // Rotate both velocities into the XY plane, then twist the frame so
    // the body's velocity runs along +X. All turning math is 2D in this
    // frame.
    let mut flatten = rotation_to_xy_plane(approach_velocity, body_velocity);
    let twist = flatten * body_velocity;
    flatten = DMat3::from_rotation_z(angle_about(twist, DVec3::X, DVec3::Z)) * flatten;

    let flattened_craft_velocity = flatten * approach_velocity;
    let flattened_body_velocity = flatten * body_velocity;
    let relative_velocity = flattened_craft_velocity - flattened_body_velocity;
    let excess_speed = relative_velocity.length();
    let intercept_angle = relative_velocity.y.atan2(relative_velocity.x);

    // Size the hyperbola from the requested periapsis.
    let periapsis_radius = periapsis_altitude + body.radius;
    let semi_major_axis = -mu / (excess_speed * excess_speed);
    let eccentricity = 1.0 - periapsis_radius / semi_major_axis;
    if !(eccentricity > 1.0) {
        return Err(FlybyError::NonHyperbolicApproach {
            speed: excess_speed,
            periapsis: periapsis_radius,
        });
    }
    let mut impact_parameter =
        semi_major_axis * (eccentricity * eccentricity - 1.0).sqrt();
    if !crossing_ahead {
        impact_parameter = -impact_parameter;
    }
    let miss_distance = impact_parameter / intercept_angle.sin();
    let turning_angle = 2.0 * (1.0 / eccentricity).asin();

    // Which way the hyperbola bends depends on which side of the body the
    // asymptote passes and whether the craft approaches from above or
    // below the body's velocity axis. Note the flattening frame takes its
    // up-normal from v_craft x v_body, which keeps the relative velocity's
    // y-component non-positive; the approaches-upward cases are reached
    // through the miss-distance sign, not through positive y.
    let passes_ahead = miss_distance >= 0.0;
    let approaches_downward = relative_velocity.y < 0.0;
    let (ejection_angle, pe_angle, turning_sign) = match (passes_ahead, approaches_downward) {
        (true, true) | (false, false) => (
            intercept_angle - turning_angle,
            intercept_angle + FRAC_PI_2 - turning_angle / 2.0,
            -1.0,
        ),
        (true, false) | (false, true) => (
            intercept_angle + turning_angle,
            intercept_angle - FRAC_PI_2 + turning_angle / 2.0,
            1.0,
        ),
    };

    let periapsis_position = rotate_z(DVec3::new(periapsis_radius, 0.0, 0.0), pe_angle);
    let periapsis_speed = (mu * (2.0 / periapsis_radius - 1.0 / semi_major_axis)).sqrt();
    let periapsis_velocity = rotate_z(periapsis_position, turning_sign * FRAC_PI_2)
        .normalize()
        * periapsis_speed;

    let ejection_velocity = rotate_z(DVec3::new(excess_speed, 0.0, 0.0), ejection_angle);

    // Both asymptotes pass through the point where the incoming asymptote
    // crosses the periapsis axis; walk each outward to the sphere of
    // influence.
    let asymptote_crossing = intersection_of_lines(
        DVec3::ZERO,
        periapsis_position,
        DVec3::new(miss_distance, 0.0, 0.0),
        relative_velocity,
    )?;
    let soi_entry = intersection_directed_ray_circle(
        DVec2::ZERO,
        soi,
        asymptote_crossing.truncate(),
        -relative_velocity.truncate(),
    )
    .into_iter()
    .next()
    .ok_or(GeometryError::NoIntersection)?;
    let soi_exit = intersection_directed_ray_circle(
        DVec2::ZERO,
        soi,
        asymptote_crossing.truncate(),
        ejection_velocity.truncate(),
    )
    .into_iter()
    .next()
    .ok_or(GeometryError::NoIntersection)?;

    let hyperbola = Orbit::from_position_and_velocity(
        body.clone(),
        periapsis_position,
        periapsis_velocity,
        approach_time,
    )?;

    let departure_velocity =
        flatten.inverse() * (ejection_velocity + flattened_body_velocity);
    let outbound = Orbit::from_position_and_velocity(
        body_orbit.primary().clone(),
        body_position,
        departure_velocity,
        approach_time,
    )?;

    Ok(Flyby {
        encounter: Encounter {
            approach_velocity,
            body_velocity,
            departure_velocity,
            flattened_craft_velocity,
            flattened_body_velocity,
            relative_velocity,
            ejection_velocity,
            intercept_angle,
            miss_distance,
            impact_parameter,
            turning_angle,
            ejection_angle,
            periapsis_position,
            periapsis_velocity,
            soi_entry,
            soi_exit,
        },
        hyperbola,
        outbound,
    })
}
