use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::utils::math::clamp;

/// Split axis used by the broad phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Axis-aligned bounding box used for collider bounds and BVH nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Inverted box that any `extend` or `merge` replaces.
    pub fn empty() -> Self {
        Self {
            min: Vec2::splat(f32::MAX),
            max: Vec2::splat(-f32::MAX),
        }
    }

    pub fn from_circle(center: Vec2, radius: f32) -> Self {
        Self {
            min: center - Vec2::splat(radius),
            max: center + Vec2::splat(radius),
        }
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        let mut bounds = Self::empty();
        for &p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn extend(&mut self, point: Vec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Inclusive test: boxes sharing an edge overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width() + self.height())
    }

    /// Axis along which the box is longest. Ties pick Y.
    pub fn longest_axis(&self) -> Axis {
        if self.width() > self.height() {
            Axis::X
        } else {
            Axis::Y
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }
}

/// Surface coefficients of a collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Material {
    /// Material used by colliders without one: frictionless and perfectly inelastic.
    pub const DEFAULT: Self = Self {
        friction: 0.0,
        restitution: 0.0,
    };

    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
        }
    }

    pub fn combine_with(&self, other: &Self) -> MaterialPairProperties {
        MaterialPairProperties::combine(self, other)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Coefficients for a colliding pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialPairProperties {
    pub friction: f32,
    pub restitution: f32,
}

impl MaterialPairProperties {
    /// Friction is the geometric mean, restitution the clamped maximum.
    pub fn combine(a: &Material, b: &Material) -> Self {
        Self {
            friction: (a.friction * b.friction).max(0.0).sqrt(),
            restitution: clamp(a.restitution.max(b.restitution), 0.0, 1.0),
        }
    }
}
