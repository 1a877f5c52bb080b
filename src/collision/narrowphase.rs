use glam::Vec2;

use crate::{
    collision::{clipping::contact_point, contact::ContactManifold},
    core::collider::{Collider, ColliderShape, PolygonShape},
    utils::{
        allocator::EntityId,
        math::{intervals_overlap, normalize_or, project},
    },
};

/// Separating-axis collision tests between circles and convex polygons.
pub struct NarrowPhase;

impl NarrowPhase {
    /// Tests two colliders and returns a manifold when they overlap.
    ///
    /// `rigid` selects the clipped contact point for polygon pairs; otherwise
    /// the midpoint between the centroids is used. Polygon-circle manifolds
    /// always list the polygon as collider A.
    pub fn collide(
        id_a: EntityId,
        a: &Collider,
        id_b: EntityId,
        b: &Collider,
        rigid: bool,
    ) -> Option<ContactManifold> {
        match (&a.shape, &b.shape) {
            (ColliderShape::Polygon(pa), ColliderShape::Polygon(pb)) => {
                Self::polygon_polygon(id_a, pa, id_b, pb, rigid)
            }
            (ColliderShape::Polygon(poly), ColliderShape::Circle { radius }) => {
                Self::polygon_circle(id_a, poly, a.position, id_b, b.position, *radius)
            }
            (ColliderShape::Circle { radius }, ColliderShape::Polygon(poly)) => {
                Self::polygon_circle(id_b, poly, b.position, id_a, a.position, *radius)
            }
            (ColliderShape::Circle { radius: ra }, ColliderShape::Circle { radius: rb }) => {
                Self::circle_circle(id_a, a.position, *ra, id_b, b.position, *rb)
            }
        }
    }

    pub fn polygon_polygon(
        id_a: EntityId,
        a: &PolygonShape,
        id_b: EntityId,
        b: &PolygonShape,
        rigid: bool,
    ) -> Option<ContactManifold> {
        let (poly_a, poly_b) = (&a.transformed[..], &b.transformed[..]);
        if poly_a.len() < 2 || poly_b.len() < 2 {
            return None;
        }

        let mut best = MinimumAxis::new();
        if !separating_axis(poly_a, poly_b, &mut best) || !separating_axis(poly_b, poly_a, &mut best) {
            return None;
        }

        let mut normal = best.axis;
        if normal.dot(b.centroid - a.centroid) < 0.0 {
            normal = -normal;
        }

        let contact = if rigid {
            contact_point(poly_a, poly_b, normal)
        } else {
            (a.centroid + b.centroid) * 0.5
        };

        Some(ContactManifold::new(id_a, id_b, normal, contact, best.depth))
    }

    /// Polygon edge normals plus the axis towards the vertex nearest the
    /// circle centre. Falls back to the centre-to-centre direction with a
    /// depth of one radius when no axis is usable.
    pub fn polygon_circle(
        poly_id: EntityId,
        poly: &PolygonShape,
        poly_position: Vec2,
        circle_id: EntityId,
        center: Vec2,
        radius: f32,
    ) -> Option<ContactManifold> {
        let vertices = &poly.transformed[..];
        if vertices.is_empty() {
            return None;
        }

        let mut best = MinimumAxis::new();
        let test_axis = |axis: Vec2, best: &mut MinimumAxis| -> bool {
            let (min_p, max_p) = project(vertices, axis);
            let c = center.dot(axis);
            let (min_c, max_c) = (c - radius, c + radius);
            if !intervals_overlap(min_p, max_p, min_c, max_c) {
                return false;
            }
            best.offer(axis, max_p.min(max_c) - min_p.max(min_c));
            true
        };

        for (i, &p1) in vertices.iter().enumerate() {
            let edge = vertices[(i + 1) % vertices.len()] - p1;
            let axis = edge.perp();
            if axis == Vec2::ZERO {
                continue;
            }
            if !test_axis(axis.normalize(), &mut best) {
                return None;
            }
        }

        let closest = vertices
            .iter()
            .copied()
            .min_by(|x, y| x.distance_squared(center).total_cmp(&y.distance_squared(center)))
            .unwrap_or(center);
        let axis = closest - center;
        if axis != Vec2::ZERO && !test_axis(axis.normalize(), &mut best) {
            return None;
        }

        if best.axis == Vec2::ZERO {
            best.axis = normalize_or(center - poly_position, Vec2::X);
            best.depth = radius;
        }

        let mut normal = best.axis;
        if (center - poly_position).dot(normal) < 0.0 {
            normal = -normal;
        }

        let contact = center - normal * radius;
        Some(ContactManifold::new(poly_id, circle_id, normal, contact, best.depth))
    }

    pub fn circle_circle(
        id_a: EntityId,
        center_a: Vec2,
        radius_a: f32,
        id_b: EntityId,
        center_b: Vec2,
        radius_b: f32,
    ) -> Option<ContactManifold> {
        let diff = center_b - center_a;
        let total_radius = radius_a + radius_b;
        let distance_sq = diff.length_squared();
        if distance_sq >= total_radius * total_radius {
            return None;
        }

        let distance = distance_sq.sqrt();
        let normal = if distance == 0.0 { Vec2::X } else { diff / distance };
        let contact = center_a + normal * radius_a;
        Some(ContactManifold::new(id_a, id_b, normal, contact, total_radius - distance))
    }
}

/// Running minimum-overlap axis across SAT passes.
struct MinimumAxis {
    axis: Vec2,
    depth: f32,
}

impl MinimumAxis {
    fn new() -> Self {
        Self {
            axis: Vec2::ZERO,
            depth: f32::MAX,
        }
    }

    fn offer(&mut self, axis: Vec2, overlap: f32) {
        if overlap < self.depth {
            self.depth = overlap;
            self.axis = axis;
        }
    }
}

/// Tests the edge normals of `poly_a` against `poly_b`. Returns `false` as
/// soon as one separates them.
fn separating_axis(poly_a: &[Vec2], poly_b: &[Vec2], best: &mut MinimumAxis) -> bool {
    for (i, &p1) in poly_a.iter().enumerate() {
        let edge = poly_a[(i + 1) % poly_a.len()] - p1;
        let axis = edge.perp();
        let length_sq = axis.length_squared();
        if length_sq == 0.0 {
            continue;
        }
        let axis = axis / length_sq.sqrt();

        let (min_a, max_a) = project(poly_a, axis);
        let (min_b, max_b) = project(poly_b, axis);
        if !intervals_overlap(min_a, max_a, min_b, max_b) {
            return false;
        }
        best.offer(axis, max_a.min(max_b) - min_a.max(min_b));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collider::ColliderBuilder;
    use approx::assert_abs_diff_eq;

    fn placed(builder: ColliderBuilder, at: Vec2) -> Collider {
        let mut collider = builder.build().unwrap();
        collider.update_geometry(at, 0.0);
        collider
    }

    fn ids() -> (EntityId, EntityId) {
        (EntityId::from_index(0), EntityId::from_index(1))
    }

    #[test]
    fn overlapping_boxes_resolve_along_least_axis() {
        let (ia, ib) = ids();
        let a = placed(ColliderBuilder::new().rect(Vec2::splat(10.0)), Vec2::ZERO);
        let b = placed(ColliderBuilder::new().rect(Vec2::splat(10.0)), Vec2::new(8.0, 1.0));
        let m = NarrowPhase::collide(ia, &a, ib, &b, false).unwrap();
        assert_abs_diff_eq!(m.depth, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.normal.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.contact.x, 4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.tangent.dot(m.normal), 0.0);
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let (ia, ib) = ids();
        let a = placed(ColliderBuilder::new().rect(Vec2::splat(2.0)), Vec2::ZERO);
        let b = placed(ColliderBuilder::new().rect(Vec2::splat(2.0)), Vec2::new(0.0, 3.0));
        assert!(NarrowPhase::collide(ia, &a, ib, &b, true).is_none());
    }

    #[test]
    fn normal_points_from_a_to_b() {
        let (ia, ib) = ids();
        let a = placed(ColliderBuilder::new().rect(Vec2::splat(10.0)), Vec2::new(8.0, 0.0));
        let b = placed(ColliderBuilder::new().rect(Vec2::splat(10.0)), Vec2::ZERO);
        let m = NarrowPhase::collide(ia, &a, ib, &b, false).unwrap();
        assert_abs_diff_eq!(m.normal.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn circle_first_keeps_polygon_as_a() {
        let (ia, ib) = ids();
        let circle = placed(ColliderBuilder::new().circle(1.0), Vec2::new(5.0, 0.0));
        let square = placed(ColliderBuilder::new().rect(Vec2::splat(10.0)), Vec2::ZERO);
        let m = NarrowPhase::collide(ia, &circle, ib, &square, false).unwrap();
        assert_eq!(m.collider_a, ib);
        assert_eq!(m.collider_b, ia);
        assert_abs_diff_eq!(m.normal.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.depth, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.contact.x, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn coincident_circles_use_fallback_axis() {
        let (ia, ib) = ids();
        let m = NarrowPhase::circle_circle(ia, Vec2::ZERO, 1.0, ib, Vec2::ZERO, 2.0).unwrap();
        assert_eq!(m.normal, Vec2::X);
        assert_abs_diff_eq!(m.depth, 3.0);
    }

    #[test]
    fn rigid_boxes_use_clipped_contact() {
        let (ia, ib) = ids();
        let a = placed(ColliderBuilder::new().rect(Vec2::splat(4.0)), Vec2::ZERO);
        let b = placed(ColliderBuilder::new().rect(Vec2::splat(4.0)), Vec2::new(3.0, 3.9));
        let m = NarrowPhase::collide(ia, &a, ib, &b, true).unwrap();
        assert_abs_diff_eq!(m.normal.y, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(m.contact.x, 1.5, epsilon = 1e-3);
    }
}
