//! Additional 2D math helpers layered on top of `glam`.

use glam::Vec2;

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Cross product of a scalar angular velocity with a lever arm.
#[inline]
pub fn cross_scalar(w: f32, r: Vec2) -> Vec2 {
    Vec2::new(-w * r.y, w * r.x)
}

/// Rotates `point` by `angle` radians about `origin`.
#[inline]
pub fn rotate_about(point: Vec2, origin: Vec2, angle: f32) -> Vec2 {
    if angle == 0.0 {
        return point;
    }
    origin + Vec2::from_angle(angle).rotate(point - origin)
}

/// Unit vector in the direction of `v`, or `fallback` when `v` has zero length.
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let length = v.length();
    if length == 0.0 {
        fallback
    } else {
        v / length
    }
}

#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Projects `vertices` onto `axis`, returning `(min, max)`.
pub fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), d| {
            (min.min(d), max.max(d))
        })
}

/// Two intervals overlap unless one ends strictly before the other starts.
#[inline]
pub fn intervals_overlap(min_a: f32, max_a: f32, min_b: f32, max_b: f32) -> bool {
    !(max_a < min_b || max_b < min_a)
}
