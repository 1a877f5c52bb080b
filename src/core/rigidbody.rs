use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::INERTIA_SCALAR,
    utils::math::{cross, cross_scalar},
};

/// Behaviour switches of a rigid body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyFlags {
    /// Never integrated, never moved by contacts.
    pub is_static: bool,
    /// Acquires angular velocity from point impulses.
    pub is_rigid: bool,
    /// Ignores world gravity.
    pub no_gravity: bool,
}

impl BodyFlags {
    pub const STATIC: Self = Self {
        is_static: true,
        is_rigid: false,
        no_gravity: false,
    };

    pub const RIGID: Self = Self {
        is_static: false,
        is_rigid: true,
        no_gravity: false,
    };
}

/// Initial state used to create a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDesc {
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub torque: f32,
    pub mass: f32,
    /// Scales the moment of inertia relative to mass.
    pub rotation_factor: f32,
    pub flags: BodyFlags,
    pub layer: u32,
    pub group: u32,
    pub user_data: u64,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            torque: 0.0,
            mass: 1.0,
            rotation_factor: 1.0,
            flags: BodyFlags::default(),
            layer: 0,
            group: 0,
            user_data: 0,
        }
    }
}

impl BodyDesc {
    pub fn dynamic(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn fixed(position: Vec2) -> Self {
        Self {
            position,
            flags: BodyFlags::STATIC,
            ..Self::default()
        }
    }
}

/// Rigid body kinematic and dynamic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub angle: f32,
    pub previous_angle: f32,
    pub angular_velocity: f32,
    pub torque: f32,
    pub mass: f32,
    pub inverse_mass: f32,
    pub inertia: f32,
    pub inverse_inertia: f32,
    pub flags: BodyFlags,
    /// Collision layer; colliders are only tested against the same layer.
    pub layer: u32,
    /// Free-form category bitmask (ray filters, gameplay).
    pub group: u32,
    pub user_data: u64,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(BodyDesc::default())
    }
}

impl RigidBody {
    /// Builds a body from its description. A body flagged static, or with a
    /// non-positive mass, becomes static with zero inverse mass and inertia.
    pub fn new(desc: BodyDesc) -> Self {
        let mut flags = desc.flags;
        let (mass, inverse_mass, inertia, inverse_inertia) =
            if desc.mass > 0.0 && !flags.is_static {
                let inertia = desc.mass * desc.rotation_factor * INERTIA_SCALAR;
                let inverse_inertia = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
                (desc.mass, 1.0 / desc.mass, inertia, inverse_inertia)
            } else {
                flags.is_static = true;
                (0.0, 0.0, 0.0, 0.0)
            };

        Self {
            position: desc.position,
            previous_position: desc.position,
            velocity: desc.velocity,
            force: desc.force,
            angle: desc.angle,
            previous_angle: desc.angle,
            angular_velocity: desc.angular_velocity,
            torque: desc.torque,
            mass,
            inverse_mass,
            inertia,
            inverse_inertia,
            flags,
            layer: desc.layer,
            group: desc.group,
            user_data: desc.user_data,
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static
    }

    pub fn is_rigid(&self) -> bool {
        self.flags.is_rigid
    }

    /// Teleports the body. Previous position is left untouched.
    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Accumulates a force applied during the next velocity integration.
    pub fn add_force(&mut self, force: Vec2) {
        if self.is_static() {
            return;
        }
        self.force += force;
    }

    pub fn add_torque(&mut self, torque: f32) {
        if self.is_static() {
            return;
        }
        self.torque += torque;
    }

    /// Linear impulse through the centre of mass.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.is_static() {
            return;
        }
        self.velocity += impulse * self.inverse_mass;
    }

    /// Impulse applied at a world-space point. Only rigid bodies pick up spin.
    pub fn apply_impulse_at(&mut self, impulse: Vec2, point: Vec2) {
        if self.is_static() {
            return;
        }
        if self.inverse_mass == 0.0 && self.inverse_inertia == 0.0 {
            return;
        }

        if self.inverse_mass > 0.0 {
            self.velocity += impulse * self.inverse_mass;
        }

        if !self.is_rigid() {
            return;
        }

        if self.inverse_inertia > 0.0 {
            let lever = point - self.position;
            self.angular_velocity += cross(lever, impulse) * self.inverse_inertia;
        }
    }

    /// Velocity of the material point at `point` (world space).
    pub fn point_velocity(&self, point: Vec2) -> Vec2 {
        self.velocity + cross_scalar(self.angular_velocity, point - self.position)
    }
}
