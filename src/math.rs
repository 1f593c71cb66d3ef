//! Small geometry helpers layered on top of [`glam`].
//!
//! These cover the handful of operations the orbital solvers need that
//! `glam` does not provide directly: signed angles about a reference
//! normal, rotation of a frame so that two vectors lie in the XY plane,
//! and the planar line/circle intersections used to trace flyby
//! asymptotes out to the sphere of influence.

use glam::{DMat3, DQuat, DVec2, DVec3};
use std::f64::consts::TAU;
use thiserror::Error;

/// An error from one of the planar intersection helpers.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// The two lines are parallel (or anti-parallel) and never cross.
    #[error("the two lines are parallel and do not intersect")]
    ParallelLines,

    /// The directed ray never reaches the circle.
    #[error("the directed ray does not intersect the circle")]
    NoIntersection,
}

/// Normalizes an angle into the range `[0, 2π)`.
///
/// # Example
/// ```
/// use std::f64::consts::{PI, TAU};
/// use patched_conics::math::normalize_angle;
///
/// assert_eq!(normalize_angle(-PI), PI);
/// assert_eq!(normalize_angle(TAU + 1.0), 1.0);
/// ```
pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// Counterclockwise angle from `from` to `to` about `normal`, in `[0, 2π)`.
///
/// Both vectors are assumed to lie in (or be projected onto) the plane
/// perpendicular to `normal`; `normal` picks which way "counterclockwise"
/// goes.
pub fn angle_about(from: DVec3, to: DVec3, normal: DVec3) -> f64 {
    let n = normal.normalize();
    normalize_angle(from.cross(to).dot(n).atan2(from.dot(to)))
}

/// Rotates a vector about the Z axis by `angle` radians (counterclockwise
/// when viewed from +Z).
pub fn rotate_z(v: DVec3, angle: f64) -> DVec3 {
    let (sin, cos) = angle.sin_cos();
    DVec3::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos, v.z)
}

/// Builds the rotation that maps the plane spanned by `a` and `b` onto the
/// XY plane.
///
/// After applying the returned matrix, both `a` and `b` have a Z component
/// of zero, which reduces three-dimensional flyby geometry to planar
/// trigonometry. The matrix is a pure rotation; its inverse recovers the
/// original frame.
///
/// If `a` and `b` are (anti-)parallel they span no unique plane; any plane
/// containing them is equivalent, and one is picked arbitrarily.
pub fn rotation_to_xy_plane(a: DVec3, b: DVec3) -> DMat3 {
    let cross = a.cross(b);
    let normal = if cross.length_squared() > 1e-24 * a.length_squared() * b.length_squared() {
        cross.normalize()
    } else {
        let fallback = a.cross(DVec3::Z);
        if fallback.length_squared() > f64::EPSILON {
            fallback.normalize()
        } else {
            DVec3::Y
        }
    };
    DMat3::from_quat(DQuat::from_rotation_arc(normal, DVec3::Z))
}

/// Intersects two planar lines, each given by a point and a direction.
///
/// Only the X and Y components participate; the result lies in the
/// `z = 0` plane. Errors when the directions are parallel.
pub fn intersection_of_lines(
    p0: DVec3,
    d0: DVec3,
    p1: DVec3,
    d1: DVec3,
) -> Result<DVec3, GeometryError> {
    let denominator = d0.x * d1.y - d0.y * d1.x;
    if denominator.abs() < 1e-12 {
        return Err(GeometryError::ParallelLines);
    }
    let t = ((p1.x - p0.x) * d1.y - (p1.y - p0.y) * d1.x) / denominator;
    Ok(DVec3::new(p0.x + d0.x * t, p0.y + d0.y * t, 0.0))
}

/// Intersects a directed ray with a circle, in 2D.
///
/// Returns the crossing points in ray order (nearest first). Crossings
/// behind the ray origin are discarded; zero, one, or two points may be
/// returned.
pub fn intersection_directed_ray_circle(
    center: DVec2,
    radius: f64,
    origin: DVec2,
    direction: DVec2,
) -> Vec<DVec2> {
    let offset = origin - center;
    let a = direction.length_squared();
    let b = 2.0 * direction.dot(offset);
    let c = offset.length_squared() - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || a == 0.0 {
        return Vec::new();
    }

    let sqrt_disc = discriminant.sqrt();
    let mut results = Vec::with_capacity(2);
    for t in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
        if t >= 0.0 {
            results.push(origin + direction * t);
        }
    }
    results
}
