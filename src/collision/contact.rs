use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::utils::allocator::EntityId;

/// Contact record for one collider pair, rebuilt every step.
///
/// `normal` points from collider A towards collider B and `tangent` is the
/// normal rotated a quarter turn counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactManifold {
    pub collider_a: EntityId,
    pub collider_b: EntityId,
    pub normal: Vec2,
    pub tangent: Vec2,
    pub contact: Vec2,
    pub depth: f32,
    pub colliding: bool,
}

impl ContactManifold {
    pub fn new(collider_a: EntityId, collider_b: EntityId, normal: Vec2, contact: Vec2, depth: f32) -> Self {
        Self {
            collider_a,
            collider_b,
            normal,
            tangent: normal.perp(),
            contact,
            depth,
            colliding: true,
        }
    }

    /// `true` when this manifold involves `collider`.
    pub fn involves(&self, collider: EntityId) -> bool {
        self.collider_a == collider || self.collider_b == collider
    }
}
