//! Global configuration constants and the per-world configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Maximum number of rigid bodies a world holds by default.
pub const MAX_BODIES: usize = 8000;

/// Maximum number of colliders a world holds by default.
pub const MAX_COLLIDERS: usize = 16000;

/// Maximum number of materials a world holds by default.
pub const MAX_MATERIALS: usize = 128;

/// Maximum number of contact manifolds alive at once.
pub const MAX_MANIFOLDS: usize = 8000;

/// Default gravity vector. Screen space: positive Y points down.
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, 1000.0];

/// Exponential drag applied to linear velocity (per second).
pub const DEFAULT_LINEAR_DRAG: f32 = 2.0;

/// Exponential drag applied to angular velocity (per second).
pub const DEFAULT_ANGULAR_DRAG: f32 = 2.0;

/// Moment of inertia = mass * rotation factor * this scalar.
pub const INERTIA_SCALAR: f32 = 500.0;

/// Penetration tolerated before positional correction kicks in.
pub const DEFAULT_SLOP: f32 = 0.02;

/// Fraction of the remaining penetration corrected per step.
pub const DEFAULT_CORRECTION_PERCENT: f32 = 0.2;

/// Maximum distance of a vertex from an edge line to count as lying on it.
pub const CONTACT_PLANE_TOLERANCE: f32 = 0.25;

/// Effective masses below this are skipped by the solver.
pub const MIN_EFFECTIVE_MASS: f32 = 0.0005;

/// Tangential speeds below this produce no friction impulse.
pub const MIN_TANGENT_SPEED: f32 = 0.0005;

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Tunables for a [`crate::world::PhysicsWorld`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub max_bodies: usize,
    pub max_colliders: usize,
    pub max_materials: usize,
    pub max_manifolds: usize,
    pub gravity: [f32; 2],
    pub linear_drag: f32,
    pub angular_drag: f32,
    pub slop: f32,
    pub correction_percent: f32,
    /// Keep manifolds alive after the solve so a render pass can read them.
    /// The host frees them with `release_manifolds`.
    pub retain_manifolds: bool,
    /// Refresh collider geometry on the rayon pool.
    pub parallel: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_bodies: MAX_BODIES,
            max_colliders: MAX_COLLIDERS,
            max_materials: MAX_MATERIALS,
            max_manifolds: MAX_MANIFOLDS,
            gravity: DEFAULT_GRAVITY,
            linear_drag: DEFAULT_LINEAR_DRAG,
            angular_drag: DEFAULT_ANGULAR_DRAG,
            slop: DEFAULT_SLOP,
            correction_percent: DEFAULT_CORRECTION_PERCENT,
            retain_manifolds: false,
            parallel: false,
        }
    }
}

impl WorldConfig {
    /// A small world, handy for tests and tools.
    pub fn with_capacity(bodies: usize, colliders: usize, manifolds: usize) -> Self {
        Self {
            max_bodies: bodies,
            max_colliders: colliders,
            max_manifolds: manifolds,
            ..Self::default()
        }
    }

    /// Zero gravity, otherwise default.
    pub fn weightless() -> Self {
        Self {
            gravity: [0.0, 0.0],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let capacities = [
            ("max_bodies", self.max_bodies),
            ("max_colliders", self.max_colliders),
            ("max_materials", self.max_materials),
            ("max_manifolds", self.max_manifolds),
        ];
        for (name, value) in capacities {
            if value == 0 {
                return Err(PhysicsError::InvalidConfig(format!("{name} must be non-zero")));
            }
            if value >= u32::MAX as usize {
                return Err(PhysicsError::InvalidConfig(format!(
                    "{name} must fit a 32-bit handle"
                )));
            }
        }
        if self.linear_drag < 0.0 || self.angular_drag < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "drag coefficients must be non-negative".into(),
            ));
        }
        if self.slop < 0.0 {
            return Err(PhysicsError::InvalidConfig("slop must be non-negative".into()));
        }
        if !(0.0..=1.0).contains(&self.correction_percent) {
            return Err(PhysicsError::InvalidConfig(format!(
                "correction_percent {} outside [0, 1]",
                self.correction_percent
            )));
        }
        Ok(())
    }
}
