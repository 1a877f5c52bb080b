//! Collision detection: BVH broad phase, SAT narrow phase, contact manifolds and ray casts.

pub mod broadphase;
pub mod clipping;
pub mod contact;
pub mod narrowphase;
pub mod queries;

pub use broadphase::{Bvh, BvhNode, LeafHit};
pub use contact::ContactManifold;
pub use narrowphase::NarrowPhase;
pub use queries::{RaycastHit, RaycastQuery};
