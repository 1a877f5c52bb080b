use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::types::Aabb;
use crate::{
    error::{PhysicsError, Result},
    utils::{allocator::EntityId, math::rotate_about},
};

/// Local vertex template plus the world-space copy refreshed every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonShape {
    pub identity: Vec<Vec2>,
    pub transformed: Vec<Vec2>,
    pub scale: f32,
    pub centroid: Vec2,
}

impl PolygonShape {
    pub fn new(identity: Vec<Vec2>, scale: f32) -> Self {
        let transformed = identity.clone();
        Self {
            identity,
            transformed,
            scale,
            centroid: Vec2::ZERO,
        }
    }

    pub fn count(&self) -> usize {
        self.identity.len()
    }

    /// Rewrites the world vertices and returns their bounds. The centroid is
    /// the mean of the transformed vertices.
    fn transform(&mut self, position: Vec2, angle: f32) -> Aabb {
        let rotation = Vec2::from_angle(angle);
        let mut bounds = Aabb::empty();
        let mut sum = Vec2::ZERO;
        for (out, local) in self.transformed.iter_mut().zip(&self.identity) {
            let scaled = *local * self.scale;
            *out = if angle == 0.0 {
                position + scaled
            } else {
                position + rotation.rotate(scaled)
            };
            bounds.extend(*out);
            sum += *out;
        }
        self.centroid = sum / self.identity.len().max(1) as f32;
        bounds
    }
}

/// Collider geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Circle { radius: f32 },
    Polygon(PolygonShape),
}

/// Discriminant of [`ColliderShape`], for queries that do not need the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Polygon,
}

impl ColliderShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ColliderShape::Circle { .. } => ShapeKind::Circle,
            ColliderShape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            ColliderShape::Circle { radius } if !(*radius > 0.0) => Err(
                PhysicsError::DegenerateShape(format!("circle radius {radius} must be positive")),
            ),
            ColliderShape::Polygon(poly) if poly.count() < 3 => {
                Err(PhysicsError::DegenerateShape(format!(
                    "polygon needs at least 3 vertices, got {}",
                    poly.count()
                )))
            }
            ColliderShape::Polygon(poly) if !(poly.scale > 0.0) => Err(
                PhysicsError::DegenerateShape(format!("polygon scale {} must be positive", poly.scale)),
            ),
            _ => Ok(()),
        }
    }
}

/// Per-step bitmask recording how far a collider got through the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderPhase(u8);

impl ColliderPhase {
    pub const NONE: Self = Self(0);
    /// Passed the refresh filter and entered the broad phase.
    pub const BROAD: Self = Self(1 << 0);
    /// Its tight bounds overlapped another collider's.
    pub const NARROW: Self = Self(1 << 1);
    /// Produced a manifold this step.
    pub const RESOLVE: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// Convex shape attached to a rigid body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub body: EntityId,
    pub material: EntityId,
    /// Offset from the body origin, rotated with the body.
    pub offset: Vec2,
    /// World position as of the last geometry update.
    pub position: Vec2,
    pub bounding_box: Aabb,
    pub phase: ColliderPhase,
    pub user_data: u64,
}

impl Collider {
    pub fn builder() -> ColliderBuilder {
        ColliderBuilder::new()
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Circle radius, 0 for polygons.
    pub fn radius(&self) -> f32 {
        match self.shape {
            ColliderShape::Circle { radius } => radius,
            ColliderShape::Polygon(_) => 0.0,
        }
    }

    /// World-space vertices; empty for circles.
    pub fn vertices(&self) -> &[Vec2] {
        match &self.shape {
            ColliderShape::Polygon(poly) => &poly.transformed,
            ColliderShape::Circle { .. } => &[],
        }
    }

    /// Polygon centroid or circle centre.
    pub fn centroid(&self) -> Vec2 {
        match &self.shape {
            ColliderShape::Polygon(poly) => poly.centroid,
            ColliderShape::Circle { .. } => self.position,
        }
    }

    /// Recomputes world geometry from the owning body's pose.
    pub fn update_geometry(&mut self, body_position: Vec2, body_angle: f32) {
        let position = rotate_about(body_position + self.offset, body_position, body_angle);
        self.position = position;
        self.bounding_box = match &mut self.shape {
            ColliderShape::Circle { radius } => Aabb::from_circle(position, *radius),
            ColliderShape::Polygon(poly) => poly.transform(position, body_angle),
        };
    }
}

/// Builder for colliders. The owning body must be set before the collider is
/// added to a world.
#[derive(Debug, Clone)]
pub struct ColliderBuilder {
    shape: ColliderShape,
    body: EntityId,
    material: EntityId,
    offset: Vec2,
    user_data: u64,
}

impl Default for ColliderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColliderBuilder {
    pub fn new() -> Self {
        Self {
            shape: ColliderShape::Circle { radius: 1.0 },
            body: EntityId::NONE,
            material: EntityId::NONE,
            offset: Vec2::ZERO,
            user_data: 0,
        }
    }

    pub fn circle(mut self, radius: f32) -> Self {
        self.shape = ColliderShape::Circle { radius };
        self
    }

    /// Convex polygon from a local vertex template, scaled uniformly.
    pub fn polygon(mut self, vertices: impl Into<Vec<Vec2>>, scale: f32) -> Self {
        self.shape = ColliderShape::Polygon(PolygonShape::new(vertices.into(), scale));
        self
    }

    /// Axis-aligned box of `size`, centred on the collider position.
    pub fn rect(self, size: Vec2) -> Self {
        let half = size * 0.5;
        self.polygon(
            vec![
                Vec2::new(-half.x, -half.y),
                Vec2::new(-half.x, half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(half.x, -half.y),
            ],
            1.0,
        )
    }

    pub fn attached_to(mut self, body: EntityId) -> Self {
        self.body = body;
        self
    }

    pub fn material(mut self, material: EntityId) -> Self {
        self.material = material;
        self
    }

    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    /// Validates the shape. World geometry is filled in when the collider is
    /// added to a world.
    pub fn build(self) -> Result<Collider> {
        self.shape.validate()?;
        Ok(Collider {
            shape: self.shape,
            body: self.body,
            material: self.material,
            offset: self.offset,
            position: self.offset,
            bounding_box: Aabb::empty(),
            phase: ColliderPhase::NONE,
            user_data: self.user_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn rect_geometry_follows_body() {
        let mut collider = ColliderBuilder::new().rect(Vec2::new(4.0, 2.0)).build().unwrap();
        collider.update_geometry(Vec2::new(10.0, 5.0), 0.0);
        assert_eq!(collider.bounding_box.min, Vec2::new(8.0, 4.0));
        assert_eq!(collider.bounding_box.max, Vec2::new(12.0, 6.0));
        assert_abs_diff_eq!(collider.centroid().x, 10.0);
        assert_abs_diff_eq!(collider.centroid().y, 5.0);
    }

    #[test]
    fn rotated_rect_swaps_extents() {
        let mut collider = ColliderBuilder::new().rect(Vec2::new(4.0, 2.0)).build().unwrap();
        collider.update_geometry(Vec2::ZERO, FRAC_PI_2);
        assert_abs_diff_eq!(collider.bounding_box.width(), 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(collider.bounding_box.height(), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn offset_rotates_about_body_origin() {
        let mut collider = ColliderBuilder::new()
            .circle(1.0)
            .offset(Vec2::new(2.0, 0.0))
            .build()
            .unwrap();
        collider.update_geometry(Vec2::ZERO, FRAC_PI_2);
        assert_abs_diff_eq!(collider.position.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(collider.position.y, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(collider.bounding_box.min.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn scale_applies_to_identity() {
        let mut collider = ColliderBuilder::new()
            .polygon(vec![Vec2::ZERO, Vec2::X, Vec2::Y], 3.0)
            .build()
            .unwrap();
        collider.update_geometry(Vec2::ZERO, 0.0);
        assert_eq!(collider.vertices()[1], Vec2::new(3.0, 0.0));
        assert_eq!(collider.radius(), 0.0);
    }

    #[test]
    fn degenerate_shapes_are_rejected() {
        assert!(matches!(
            ColliderBuilder::new().circle(0.0).build(),
            Err(PhysicsError::DegenerateShape(_))
        ));
        assert!(matches!(
            ColliderBuilder::new().polygon(vec![Vec2::ZERO, Vec2::X], 1.0).build(),
            Err(PhysicsError::DegenerateShape(_))
        ));
    }

    #[test]
    fn phase_bits_accumulate() {
        let mut phase = ColliderPhase::BROAD;
        phase.insert(ColliderPhase::NARROW);
        assert!(phase.contains(ColliderPhase::BROAD));
        assert!(phase.contains(ColliderPhase::NARROW));
        assert!(!phase.contains(ColliderPhase::RESOLVE));
    }
}
