use glam::Vec2;

use crate::{
    collision::clipping::segment_intersection,
    core::{
        collider::{Collider, ColliderShape},
        types::Aabb,
    },
    utils::{allocator::EntityId, math::normalize_or},
};

/// Result of a ray cast. `touched` is false when nothing was hit, in which
/// case `distance` is the ray length and `collider` is [`EntityId::NONE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub touched: bool,
    pub distance: f32,
    pub point: Vec2,
    pub normal: Vec2,
    pub collider: EntityId,
}

impl RaycastHit {
    pub fn miss(query: &RaycastQuery) -> Self {
        Self {
            touched: false,
            distance: query.max_distance,
            point: query.end(),
            normal: Vec2::ZERO,
            collider: EntityId::NONE,
        }
    }
}

/// Ray with optional filters. A group filter accepts colliders whose body
/// group shares a bit with it; a layer filter requires an exact layer match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastQuery {
    pub origin: Vec2,
    pub direction: Vec2,
    pub max_distance: f32,
    pub group: Option<u32>,
    pub layer: Option<u32>,
}

impl RaycastQuery {
    /// `direction` is normalised; a zero direction falls back to +X.
    pub fn new(origin: Vec2, direction: Vec2, max_distance: f32) -> Self {
        Self {
            origin,
            direction: normalize_or(direction, Vec2::X),
            max_distance,
            group: None,
            layer: None,
        }
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn end(&self) -> Vec2 {
        self.origin + self.direction * self.max_distance
    }

    pub fn point_at(&self, distance: f32) -> Vec2 {
        self.origin + self.direction * distance
    }

    /// `true` when a collider owned by a body with `group`/`layer` passes the filters.
    pub fn accepts(&self, group: u32, layer: u32) -> bool {
        if let Some(mask) = self.group {
            if group & mask == 0 {
                return false;
            }
        }
        if let Some(required) = self.layer {
            if layer != required {
                return false;
            }
        }
        true
    }
}

/// Slab test. Returns the entry and exit distances along the ray, or `None`
/// when the ray misses or the box lies entirely behind the origin.
pub fn ray_aabb(ray: &RaycastQuery, bounds: &Aabb) -> Option<(f32, f32)> {
    let mut t_near = f32::MIN;
    let mut t_far = f32::MAX;

    for axis in 0..2 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        let (min, max) = (bounds.min[axis], bounds.max[axis]);

        if dir.abs() < 1e-8 {
            if origin < min || origin > max {
                return None;
            }
            continue;
        }

        let mut t1 = (min - origin) / dir;
        let mut t2 = (max - origin) / dir;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_near = t_near.max(t1);
        t_far = t_far.min(t2);

        if t_near > t_far || t_far < 0.0 {
            return None;
        }
    }

    Some((t_near, t_far))
}

/// Ray against a circle; returns the distance to the first surface crossing
/// (the exit point when the origin is inside) and the outward normal there.
pub fn ray_circle(ray: &RaycastQuery, center: Vec2, radius: f32) -> Option<(f32, Vec2)> {
    let m = ray.origin - center;
    let b = m.dot(ray.direction);
    let c = m.length_squared() - radius * radius;

    if c > 0.0 && b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let mut distance = -b - root;
    if distance < 0.0 {
        distance = -b + root;
        if distance < 0.0 {
            return None;
        }
    }
    if distance > ray.max_distance {
        return None;
    }

    let normal = normalize_or(ray.point_at(distance) - center, Vec2::ZERO);
    Some((distance, normal))
}

/// Ray against a polygon outline: the nearest edge crossing within the ray length.
pub fn ray_polygon(ray: &RaycastQuery, vertices: &[Vec2]) -> Option<(f32, Vec2)> {
    if vertices.len() < 3 {
        return None;
    }

    let start = ray.origin;
    let end = ray.end();
    let mut best_t = 1.0;
    let mut best_normal = None;

    for (i, &p1) in vertices.iter().enumerate() {
        let p2 = vertices[(i + 1) % vertices.len()];
        if let Some((t, normal)) = segment_intersection(p1, p2, start, end) {
            if t >= 0.0 && t < best_t {
                best_t = t;
                best_normal = Some(normal);
            }
        }
    }

    // edge normals depend on winding; report the side facing the ray
    best_normal.map(|normal| {
        let facing = if normal.dot(ray.direction) > 0.0 { -normal } else { normal };
        (best_t * ray.max_distance, facing)
    })
}

/// Exact ray test against a collider's current world geometry.
pub fn ray_collider(ray: &RaycastQuery, collider: &Collider) -> Option<(f32, Vec2)> {
    match &collider.shape {
        ColliderShape::Circle { radius } => ray_circle(ray, collider.position, *radius),
        ColliderShape::Polygon(poly) => ray_polygon(ray, &poly.transformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn slab_hits_box_ahead() {
        let ray = RaycastQuery::new(Vec2::new(-10.0, 0.5), Vec2::X, 100.0);
        let bounds = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let (near, far) = ray_aabb(&ray, &bounds).unwrap();
        assert_abs_diff_eq!(near, 10.0);
        assert_abs_diff_eq!(far, 11.0);
    }

    #[test]
    fn slab_rejects_box_behind_and_parallel_miss() {
        let bounds = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let behind = RaycastQuery::new(Vec2::new(5.0, 0.5), Vec2::X, 100.0);
        assert!(ray_aabb(&behind, &bounds).is_none());
        let parallel = RaycastQuery::new(Vec2::new(-5.0, 2.0), Vec2::X, 100.0);
        assert!(ray_aabb(&parallel, &bounds).is_none());
    }

    #[test]
    fn circle_hit_distance_and_normal() {
        let ray = RaycastQuery::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 50.0);
        let (distance, normal) = ray_circle(&ray, Vec2::new(10.0, 0.0), 2.0).unwrap();
        assert_abs_diff_eq!(distance, 8.0, epsilon = 1e-5);
        assert_abs_diff_eq!(normal.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn circle_beyond_range_is_missed() {
        let ray = RaycastQuery::new(Vec2::ZERO, Vec2::X, 5.0);
        assert!(ray_circle(&ray, Vec2::new(10.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn polygon_normal_faces_ray() {
        let square = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let ray = RaycastQuery::new(Vec2::new(-11.0, 0.0), Vec2::X, 20.0);
        let (distance, normal) = ray_polygon(&ray, &square).unwrap();
        assert_abs_diff_eq!(distance, 10.0, epsilon = 1e-4);
        assert_abs_diff_eq!(normal.x, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(normal.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn filters_match_group_bits_and_exact_layer() {
        let ray = RaycastQuery::new(Vec2::ZERO, Vec2::X, 1.0).with_group(0b0110).with_layer(2);
        assert!(ray.accepts(0b0100, 2));
        assert!(!ray.accepts(0b1000, 2));
        assert!(!ray.accepts(0b0100, 3));
        assert!(RaycastQuery::new(Vec2::ZERO, Vec2::X, 1.0).accepts(0, 7));
    }
}
