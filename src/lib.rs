//! psx2d – fixed-capacity 2D rigid-body physics for Rust.
//!
//! Bodies, colliders, materials and contact manifolds live in bounded pools
//! addressed by generational handles. Each step integrates bodies, rebuilds a
//! bounding volume hierarchy, generates manifolds with the separating axis
//! test and resolves them with a sequential impulse solver.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

use std::time::Duration;

pub use glam::Vec2;

pub use crate::collision::{
    broadphase::Bvh,
    contact::ContactManifold,
    queries::{RaycastHit, RaycastQuery},
};
pub use crate::config::WorldConfig;
pub use crate::core::{
    collider::{Collider, ColliderBuilder, ColliderPhase, ColliderShape, ShapeKind},
    rigidbody::{BodyDesc, BodyFlags, RigidBody},
    types::{Aabb, Material},
};
pub use crate::dynamics::{integrator::Integrator, solver::ContactSolver};
pub use crate::error::{PhysicsError, Result};
pub use crate::utils::allocator::{Arena, EntityId};
pub use crate::world::{PhysicsWorld, SharedWorld};

/// Steps taken by [`PhysicsEngine::advance`] at most per call, so a long
/// stall does not trigger a burst of catch-up steps.
pub const MAX_SUBSTEPS: u32 = 8;

/// High-level convenience wrapper that owns a [`PhysicsWorld`] and drives it
/// at a fixed timestep.
#[derive(Debug)]
pub struct PhysicsEngine {
    world: PhysicsWorld,
    timestep: f32,
    accumulator: f32,
}

impl Default for PhysicsEngine {
    /// Default world stepped at [`config::DEFAULT_TIME_STEP`].
    fn default() -> Self {
        Self {
            world: PhysicsWorld::default(),
            timestep: config::DEFAULT_TIME_STEP,
            accumulator: 0.0,
        }
    }
}

impl PhysicsEngine {
    /// Creates an engine with the provided fixed timestep.
    pub fn new(config: WorldConfig, timestep: f32) -> Result<Self> {
        if !(timestep > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "timestep {timestep} must be positive"
            )));
        }
        Ok(Self {
            world: PhysicsWorld::new(config)?,
            timestep,
            accumulator: 0.0,
        })
    }

    pub fn timestep(&self) -> f32 {
        self.timestep
    }

    /// Adds a rigid body to the world and returns its handle.
    pub fn add_body(&mut self, desc: BodyDesc) -> Result<EntityId> {
        self.world.create_body(desc)
    }

    /// Adds a collider attached to an existing body.
    pub fn add_collider(&mut self, collider: Collider) -> Result<EntityId> {
        self.world.add_collider(collider)
    }

    /// Advances a single fixed step.
    pub fn step(&mut self) -> Result<()> {
        self.world.step(self.timestep)
    }

    /// Feeds wall-clock time into the accumulator and runs as many fixed steps
    /// as fit. Returns the number of steps taken.
    pub fn advance(&mut self, elapsed: Duration) -> Result<u32> {
        self.accumulator += elapsed.as_secs_f32();
        let mut steps = 0;
        while self.accumulator >= self.timestep && steps < MAX_SUBSTEPS {
            self.world.step(self.timestep)?;
            utils::logging::warn_if_over_budget(
                self.world.step_count(),
                self.world.last_timings().total(),
                Duration::from_secs_f32(self.timestep),
            );
            self.accumulator -= self.timestep;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            // drop the backlog rather than spiral
            self.accumulator = self.accumulator.min(self.timestep);
        }
        Ok(steps)
    }

    /// Fraction of a step left in the accumulator, for render interpolation
    /// between previous and current poses.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.timestep).clamp(0.0, 1.0)
    }

    /// Position of a body interpolated by [`alpha`](Self::alpha).
    pub fn interpolated_position(&self, id: EntityId) -> Result<Vec2> {
        let body = self.world.body(id)?;
        Ok(body.previous_position.lerp(body.position, self.alpha()))
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn into_world(self) -> PhysicsWorld {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn advance_runs_whole_steps_and_keeps_remainder() {
        let mut engine = PhysicsEngine::new(WorldConfig::weightless(), 0.01).unwrap();
        let steps = engine.advance(Duration::from_millis(25)).unwrap();
        assert_eq!(steps, 2);
        assert_abs_diff_eq!(engine.alpha(), 0.5, epsilon = 1e-3);
    }

    #[test]
    fn advance_caps_catch_up() {
        let mut engine = PhysicsEngine::new(WorldConfig::weightless(), 0.01).unwrap();
        let steps = engine.advance(Duration::from_secs(1)).unwrap();
        assert_eq!(steps, MAX_SUBSTEPS);
        assert!(engine.alpha() <= 1.0);
    }

    #[test]
    fn default_engine_steps_at_sixty_hertz() {
        let mut engine = PhysicsEngine::default();
        assert_abs_diff_eq!(engine.timestep(), 1.0 / 60.0);
        assert_eq!(engine.advance(Duration::from_millis(55)).unwrap(), 3);
        assert_eq!(engine.world().step_count(), 3);
    }

    #[test]
    fn rejects_non_positive_timestep() {
        assert!(matches!(
            PhysicsEngine::new(WorldConfig::default(), 0.0),
            Err(PhysicsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn interpolates_between_poses() {
        let mut engine = PhysicsEngine::new(WorldConfig::weightless(), 0.1).unwrap();
        let id = engine
            .add_body(BodyDesc {
                velocity: Vec2::new(10.0, 0.0),
                ..BodyDesc::dynamic(Vec2::ZERO)
            })
            .unwrap();
        engine.advance(Duration::from_millis(150)).unwrap();
        let body = engine.world().body(id).unwrap();
        let expected = body.previous_position.lerp(body.position, engine.alpha());
        assert_eq!(engine.interpolated_position(id).unwrap(), expected);
    }
}
