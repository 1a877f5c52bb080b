//! Contact-plane extraction and segment intersection helpers.

use glam::Vec2;
use log::warn;

use crate::{config::CONTACT_PLANE_TOLERANCE, utils::math::cross};

/// A plane holds its defining edge plus up to two vertices of the other
/// polygon lying on that edge's line.
const MAX_PLANE_POINTS: usize = 4;
const EDGE_POINTS: usize = 2;

/// Edge of `poly` whose midpoint projects furthest along `normal`.
pub fn find_segment(poly: &[Vec2], normal: Vec2) -> [Vec2; 2] {
    let mut best_projection = f32::MIN;
    let mut segment = [Vec2::ZERO; 2];

    for (i, &p1) in poly.iter().enumerate() {
        let p2 = poly[(i + 1) % poly.len()];
        let projection = ((p1 + p2) * 0.5).dot(normal);
        if projection > best_projection {
            best_projection = projection;
            segment = [p1, p2];
        }
    }

    segment
}

/// `true` when `point` lies within the tolerance of the infinite line through `edge`.
pub fn plane_contains_point(edge: [Vec2; 2], point: Vec2) -> bool {
    let tolerance_sq = CONTACT_PLANE_TOLERANCE * CONTACT_PLANE_TOLERANCE;
    let ab = edge[1] - edge[0];
    let ap = point - edge[0];

    let length_sq = ab.length_squared();
    if length_sq == 0.0 {
        return ap.length_squared() < tolerance_sq;
    }

    let c = cross(ab, ap);
    (c * c) / length_sq < tolerance_sq
}

/// Single contact point between two overlapping polygons separated along `normal`
/// (pointing from `poly_a` to `poly_b`).
///
/// When a vertex of one polygon lies on the other's edge, the point is the mean
/// of the plane points strictly between the two extreme projections along the
/// edge. Deeper contacts clip one edge against the other instead.
pub fn contact_point(poly_a: &[Vec2], poly_b: &[Vec2], normal: Vec2) -> Vec2 {
    let edge_a = find_segment(poly_a, normal);
    let edge_b = find_segment(poly_b, -normal);

    let mut plane_a: Vec<Vec2> = edge_a.to_vec();
    let mut plane_b: Vec<Vec2> = edge_b.to_vec();

    for i in 0..EDGE_POINTS {
        if plane_contains_point(edge_a, edge_b[i]) {
            plane_a.push(edge_b[i]);
        }
        if plane_contains_point(edge_b, edge_a[i]) {
            plane_b.push(edge_a[i]);
        }
    }

    let plane = if plane_a.len() >= plane_b.len() {
        plane_a
    } else {
        plane_b
    };

    if plane.len() <= EDGE_POINTS || plane.len() > MAX_PLANE_POINTS {
        // no vertex lies on the other edge: penetration beyond the tolerance
        return clipped_contact(edge_a, edge_b, normal).unwrap_or_else(|| {
            warn!("degenerate contact plane, using support points");
            (support(poly_a, normal) + support(poly_b, -normal)) * 0.5
        });
    }

    let origin = plane[0];
    let axis = plane[1] - plane[0];
    let projections: Vec<f32> = plane.iter().map(|p| (*p - origin).dot(axis)).collect();
    let (min, max) = projections
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));

    let interior: Vec<Vec2> = plane
        .iter()
        .zip(&projections)
        .filter(|(_, &p)| p > min && p < max)
        .map(|(point, _)| *point)
        .collect();

    if interior.is_empty() {
        // every point sits on an extreme, e.g. coincident edges
        return average(&plane);
    }
    average(&interior)
}

/// Clips the incident edge to the extent of the reference edge and averages
/// the clipped points behind the reference line, each moved halfway onto it.
///
/// The reference edge is the one closer to perpendicular with `normal`, so a
/// box landing flat on a long floor gets the same point whichever collider is
/// A. `None` when the reference edge has zero length, the edges do not overlap
/// along it, or no clipped point penetrates.
fn clipped_contact(edge_a: [Vec2; 2], edge_b: [Vec2; 2], normal: Vec2) -> Option<Vec2> {
    let slope = |edge: [Vec2; 2]| (edge[1] - edge[0]).normalize_or_zero().dot(normal).abs();
    let (reference, incident, outward) = if slope(edge_a) <= slope(edge_b) {
        (edge_a, edge_b, normal)
    } else {
        (edge_b, edge_a, -normal)
    };

    let tangent = (reference[1] - reference[0]).normalize_or_zero();
    if tangent == Vec2::ZERO {
        return None;
    }
    let (r0, r1) = (reference[0].dot(tangent), reference[1].dot(tangent));
    let (lo, hi) = (r0.min(r1), r0.max(r1));

    let start = incident[0].dot(tangent);
    let span = incident[1].dot(tangent) - start;
    let clipped: Vec<Vec2> = if span.abs() <= f32::EPSILON {
        if start < lo || start > hi {
            return None;
        }
        incident.to_vec()
    } else {
        let s_lo = ((lo - start) / span).clamp(0.0, 1.0);
        let s_hi = ((hi - start) / span).clamp(0.0, 1.0);
        let (s0, s1) = (s_lo.min(s_hi), s_lo.max(s_hi));
        if s0 >= s1 {
            return None;
        }
        vec![incident[0].lerp(incident[1], s0), incident[0].lerp(incident[1], s1)]
    };

    let penetrating: Vec<Vec2> = clipped
        .into_iter()
        .filter_map(|point| {
            let separation = (point - reference[0]).dot(outward);
            (separation <= 0.0).then(|| point - outward * (separation * 0.5))
        })
        .collect();

    if penetrating.is_empty() {
        return None;
    }
    Some(average(&penetrating))
}

/// Vertex of `poly` furthest along `direction`.
fn support(poly: &[Vec2], direction: Vec2) -> Vec2 {
    poly.iter()
        .copied()
        .max_by(|a, b| a.dot(direction).total_cmp(&b.dot(direction)))
        .unwrap_or(Vec2::ZERO)
}

fn average(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    points.iter().copied().sum::<Vec2>() / points.len() as f32
}

/// Intersection of segment `a1 -> a2` with segment `b1 -> b2`.
///
/// Returns the parameter along `b` (0 at `b1`, 1 at `b2`) and the unit normal
/// of segment `a`, or `None` for parallel or non-crossing segments.
pub fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<(f32, Vec2)> {
    let a = a2 - a1;
    let b = b2 - b1;
    let diff = b1 - a1;

    let denom = cross(b, a);
    if denom.abs() < 1e-8 {
        return None;
    }

    let t = cross(a, diff) / denom;
    let u = cross(b, diff) / denom;

    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    let normal = Vec2::new(a.y, -a.x).normalize_or_zero();
    Some((t, normal))
}
