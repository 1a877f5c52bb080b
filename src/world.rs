use std::sync::Arc;

use glam::Vec2;
use log::debug;
use parking_lot::RwLock;

use crate::{
    collision::{
        broadphase::Bvh,
        contact::ContactManifold,
        narrowphase::NarrowPhase,
        queries::{ray_collider, RaycastHit, RaycastQuery},
    },
    config::WorldConfig,
    core::{
        collider::{Collider, ColliderPhase, ShapeKind},
        material::MaterialStore,
        rigidbody::{BodyDesc, BodyFlags, RigidBody},
        types::{Aabb, Material},
    },
    dynamics::{
        integrator::Integrator,
        solver::{ContactSolver, SolverStepMetrics},
    },
    error::Result,
    utils::{
        allocator::{Arena, EntityId},
        logging::{PhaseTimer, StepPhase, StepTimings},
    },
};

/// World handle shared between a simulation thread and readers.
pub type SharedWorld = Arc<RwLock<PhysicsWorld>>;

/// Owns every pool of a simulation and runs the per-step pipeline.
#[derive(Debug)]
pub struct PhysicsWorld {
    config: WorldConfig,
    bodies: Arena<RigidBody>,
    colliders: Arena<Collider>,
    materials: MaterialStore,
    manifolds: Arena<ContactManifold>,
    integrator: Integrator,
    solver: ContactSolver,
    bvh: Bvh,
    active: Vec<EntityId>,
    metrics: SolverStepMetrics,
    steps: u64,
    timings: StepTimings,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::build(WorldConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WorldConfig) -> Self {
        Self {
            bodies: Arena::with_capacity("body", config.max_bodies),
            colliders: Arena::with_capacity("collider", config.max_colliders),
            materials: MaterialStore::with_capacity(config.max_materials),
            manifolds: Arena::with_capacity("manifold", config.max_manifolds),
            integrator: Integrator::from_config(&config),
            solver: ContactSolver::from_config(&config),
            bvh: Bvh::with_capacity(config.max_colliders.min(1024)),
            active: Vec::new(),
            metrics: SolverStepMetrics::default(),
            steps: 0,
            timings: StepTimings::default(),
            config,
        }
    }

    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn gravity(&self) -> Vec2 {
        self.integrator.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.integrator.gravity = gravity;
        self.config.gravity = gravity.to_array();
    }

    // bodies

    pub fn create_body(&mut self, desc: BodyDesc) -> Result<EntityId> {
        let body = RigidBody::new(desc);
        let is_static = body.is_static();
        let id = self.bodies.insert(body)?;
        debug!(
            "body {} created at ({}, {}){}",
            id.index,
            desc.position.x,
            desc.position.y,
            if is_static { " [static]" } else { "" }
        );
        Ok(id)
    }

    /// Frees a body. Its colliders stay allocated but drop out of the
    /// simulation at the next refresh.
    pub fn remove_body(&mut self, id: EntityId) -> Result<()> {
        if self.bodies.remove(id)?.is_some() {
            debug!("body {} released", id.index);
        }
        Ok(())
    }

    pub fn body(&self, id: EntityId) -> Result<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Result<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &RigidBody)> + '_ {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn move_body(&mut self, id: EntityId, position: Vec2) -> Result<()> {
        self.bodies.get_mut(id)?.move_to(position);
        Ok(())
    }

    pub fn add_force(&mut self, id: EntityId, force: Vec2) -> Result<()> {
        self.bodies.get_mut(id)?.add_force(force);
        Ok(())
    }

    pub fn apply_impulse(&mut self, id: EntityId, impulse: Vec2) -> Result<()> {
        self.bodies.get_mut(id)?.apply_impulse(impulse);
        Ok(())
    }

    pub fn apply_impulse_at(&mut self, id: EntityId, impulse: Vec2, point: Vec2) -> Result<()> {
        self.bodies.get_mut(id)?.apply_impulse_at(impulse, point);
        Ok(())
    }

    pub fn body_position(&self, id: EntityId) -> Result<Vec2> {
        Ok(self.bodies.get(id)?.position)
    }

    pub fn body_previous_position(&self, id: EntityId) -> Result<Vec2> {
        Ok(self.bodies.get(id)?.previous_position)
    }

    pub fn body_velocity(&self, id: EntityId) -> Result<Vec2> {
        Ok(self.bodies.get(id)?.velocity)
    }

    pub fn body_force(&self, id: EntityId) -> Result<Vec2> {
        Ok(self.bodies.get(id)?.force)
    }

    pub fn body_angle(&self, id: EntityId) -> Result<f32> {
        Ok(self.bodies.get(id)?.angle)
    }

    pub fn body_previous_angle(&self, id: EntityId) -> Result<f32> {
        Ok(self.bodies.get(id)?.previous_angle)
    }

    pub fn body_angular_velocity(&self, id: EntityId) -> Result<f32> {
        Ok(self.bodies.get(id)?.angular_velocity)
    }

    pub fn body_flags(&self, id: EntityId) -> Result<BodyFlags> {
        Ok(self.bodies.get(id)?.flags)
    }

    pub fn body_layer(&self, id: EntityId) -> Result<u32> {
        Ok(self.bodies.get(id)?.layer)
    }

    pub fn body_group(&self, id: EntityId) -> Result<u32> {
        Ok(self.bodies.get(id)?.group)
    }

    // colliders

    /// Attaches a collider to its body and computes its initial world geometry.
    pub fn add_collider(&mut self, mut collider: Collider) -> Result<EntityId> {
        collider.shape.validate()?;
        let body = self.bodies.get(collider.body)?;
        collider.update_geometry(body.position, body.angle);
        collider.phase = ColliderPhase::NONE;

        let (kind, body_index) = (collider.kind(), collider.body.index);
        let id = self.colliders.insert(collider)?;
        debug!("collider {} ({kind:?}) attached to body {body_index}", id.index);
        Ok(id)
    }

    pub fn remove_collider(&mut self, id: EntityId) -> Result<()> {
        if self.colliders.remove(id)?.is_some() {
            debug!("collider {} released", id.index);
        }
        Ok(())
    }

    pub fn collider(&self, id: EntityId) -> Result<&Collider> {
        self.colliders.get(id)
    }

    pub fn colliders(&self) -> impl Iterator<Item = (EntityId, &Collider)> + '_ {
        self.colliders.iter()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Colliders that passed the refresh filter of the last step.
    pub fn active_collider_count(&self) -> usize {
        self.active.len()
    }

    pub fn collider_position(&self, id: EntityId) -> Result<Vec2> {
        Ok(self.colliders.get(id)?.position)
    }

    /// Orientation of the owning body.
    pub fn collider_angle(&self, id: EntityId) -> Result<f32> {
        let collider = self.colliders.get(id)?;
        Ok(self.bodies.get(collider.body)?.angle)
    }

    pub fn collider_kind(&self, id: EntityId) -> Result<ShapeKind> {
        Ok(self.colliders.get(id)?.kind())
    }

    pub fn collider_radius(&self, id: EntityId) -> Result<f32> {
        Ok(self.colliders.get(id)?.radius())
    }

    pub fn collider_vertices(&self, id: EntityId) -> Result<&[Vec2]> {
        Ok(self.colliders.get(id)?.vertices())
    }

    pub fn collider_centroid(&self, id: EntityId) -> Result<Vec2> {
        Ok(self.colliders.get(id)?.centroid())
    }

    pub fn collider_bounds(&self, id: EntityId) -> Result<Aabb> {
        Ok(self.colliders.get(id)?.bounding_box)
    }

    pub fn collider_phase(&self, id: EntityId) -> Result<ColliderPhase> {
        Ok(self.colliders.get(id)?.phase)
    }

    pub fn collider_layer(&self, id: EntityId) -> Result<u32> {
        let collider = self.colliders.get(id)?;
        Ok(self.bodies.get(collider.body)?.layer)
    }

    pub fn collider_group(&self, id: EntityId) -> Result<u32> {
        let collider = self.colliders.get(id)?;
        Ok(self.bodies.get(collider.body)?.group)
    }

    // materials

    pub fn create_material(&mut self, material: Material) -> Result<EntityId> {
        self.materials.create(material)
    }

    pub fn remove_material(&mut self, id: EntityId) -> Result<()> {
        self.materials.remove(id)
    }

    /// Resolves a material handle; [`EntityId::NONE`] gives the default.
    pub fn material(&self, id: EntityId) -> Result<Material> {
        self.materials.resolve(id)
    }

    // manifolds

    /// Live manifolds with the handles of their pool slots.
    pub fn manifolds(&self) -> impl Iterator<Item = (EntityId, &ContactManifold)> + '_ {
        self.manifolds.iter()
    }

    pub fn manifold(&self, id: EntityId) -> Result<&ContactManifold> {
        self.manifolds.get(id)
    }

    pub fn manifold_count(&self) -> usize {
        self.manifolds.len()
    }

    pub fn release_manifolds(&mut self) {
        self.manifolds.clear();
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Impulse totals of the last solve.
    pub fn last_metrics(&self) -> &SolverStepMetrics {
        &self.metrics
    }

    /// Number of steps started so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Phase durations of the last step.
    pub fn last_timings(&self) -> &StepTimings {
        &self.timings
    }

    // step

    /// Runs one tick: integrate, refresh colliders, rebuild the BVH, generate
    /// manifolds and solve them.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        self.steps += 1;
        self.timings.reset();
        self.release_manifolds();

        let timer = PhaseTimer::start(self.steps, StepPhase::Integrate);
        self.integrator.integrate_velocities(&mut self.bodies, dt);
        self.integrator.integrate_positions(&mut self.bodies, dt);
        self.timings.record(timer);

        self.update_broadphase();

        let timer = PhaseTimer::start(self.steps, StepPhase::BvhPairs);
        self.find_contacts()?;
        self.timings.record(timer);

        let timer = PhaseTimer::start(self.steps, StepPhase::Solve);
        self.solve_contacts()?;
        self.timings.record(timer);
        Ok(())
    }

    /// Refreshes collider geometry and rebuilds the BVH without stepping, so
    /// ray casts see bodies created or moved since the last step.
    pub fn update_broadphase(&mut self) {
        let timer = PhaseTimer::start(self.steps, StepPhase::Refresh);
        self.refresh_colliders();
        self.timings.record(timer);

        let timer = PhaseTimer::start(self.steps, StepPhase::BvhBuild);
        let colliders = &self.colliders;
        self.bvh.build(&mut self.active, |id| {
            colliders
                .try_get(id)
                .map_or_else(Aabb::empty, |collider| collider.bounding_box)
        });
        self.timings.record(timer);
    }

    fn refresh_colliders(&mut self) {
        refresh_all(&mut self.colliders, &self.bodies, self.config.parallel);

        self.active.clear();
        self.active.extend(
            self.colliders
                .iter()
                .filter(|(_, collider)| collider.phase.contains(ColliderPhase::BROAD))
                .map(|(id, _)| id),
        );
    }

    fn find_contacts(&mut self) -> Result<()> {
        let colliders = &mut self.colliders;
        let bodies = &self.bodies;
        let manifolds = &mut self.manifolds;
        let mut failure = None;

        self.bvh.for_each_overlapping_pair(|a, b| {
            if failure.is_some() {
                return;
            }
            if let Err(error) = test_pair(colliders, bodies, manifolds, a, b) {
                failure = Some(error);
            }
        });

        failure.map_or(Ok(()), Err)
    }

    fn solve_contacts(&mut self) -> Result<()> {
        let mut metrics = SolverStepMetrics::default();
        for (_, manifold) in self.manifolds.iter() {
            if let Some(impulse) =
                self.solver
                    .solve_manifold(manifold, &mut self.bodies, &self.colliders, &self.materials)?
            {
                metrics.record(impulse);
            }
        }
        self.metrics = metrics;

        if !self.config.retain_manifolds {
            self.manifolds.clear();
        }
        Ok(())
    }

    /// Closest collider hit by the ray, using the BVH of the last step.
    pub fn cast_ray(&self, query: &RaycastQuery) -> RaycastHit {
        let hit = self.bvh.cast_ray(query, |id| {
            let collider = self.colliders.try_get(id)?;
            let body = self.bodies.try_get(collider.body)?;
            if !query.accepts(body.group, body.layer) {
                return None;
            }
            ray_collider(query, collider)
        });

        match hit {
            Some(hit) => RaycastHit {
                touched: true,
                distance: hit.distance,
                point: query.point_at(hit.distance),
                normal: hit.normal,
                collider: hit.collider,
            },
            None => RaycastHit::miss(query),
        }
    }
}

#[cfg(feature = "parallel")]
fn refresh_all(colliders: &mut Arena<Collider>, bodies: &Arena<RigidBody>, parallel: bool) {
    if parallel {
        colliders.par_for_each_mut(|_, collider| refresh_collider(collider, bodies));
        return;
    }
    for (_, collider) in colliders.iter_mut() {
        refresh_collider(collider, bodies);
    }
}

#[cfg(not(feature = "parallel"))]
fn refresh_all(colliders: &mut Arena<Collider>, bodies: &Arena<RigidBody>, _parallel: bool) {
    for (_, collider) in colliders.iter_mut() {
        refresh_collider(collider, bodies);
    }
}

/// Marks a collider for the broad phase and recomputes its geometry. Colliders
/// of static bodies keep the geometry computed when they were added.
fn refresh_collider(collider: &mut Collider, bodies: &Arena<RigidBody>) {
    let Some(body) = bodies.try_get(collider.body) else {
        collider.phase = ColliderPhase::NONE;
        return;
    };
    collider.phase = ColliderPhase::BROAD;
    if !body.is_static() {
        collider.update_geometry(body.position, body.angle);
    }
}

/// Filters a candidate pair, runs the narrow phase and stores the manifold.
fn test_pair(
    colliders: &mut Arena<Collider>,
    bodies: &Arena<RigidBody>,
    manifolds: &mut Arena<ContactManifold>,
    a: EntityId,
    b: EntityId,
) -> Result<()> {
    let (Some(collider_a), Some(collider_b)) = (colliders.try_get(a), colliders.try_get(b)) else {
        return Ok(());
    };
    if collider_a.body == collider_b.body {
        return Ok(());
    }
    let (Some(body_a), Some(body_b)) =
        (bodies.try_get(collider_a.body), bodies.try_get(collider_b.body))
    else {
        return Ok(());
    };
    if body_a.layer != body_b.layer {
        return Ok(());
    }
    if !collider_a.bounding_box.overlaps(&collider_b.bounding_box) {
        return Ok(());
    }

    let rigid = body_a.is_rigid() || body_b.is_rigid();
    let manifold = NarrowPhase::collide(a, collider_a, b, collider_b, rigid);

    let mut phase = ColliderPhase::NARROW;
    if let Some(manifold) = manifold {
        manifolds.insert(manifold)?;
        phase.insert(ColliderPhase::RESOLVE);
    }

    for id in [a, b] {
        if let Some(collider) = colliders.try_get_mut(id) {
            collider.phase.insert(phase);
        }
    }
    Ok(())
}
