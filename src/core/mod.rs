//! Core types describing bodies, colliders and surface materials.

pub mod collider;
pub mod material;
pub mod rigidbody;
pub mod types;

pub use collider::{Collider, ColliderBuilder, ColliderPhase, ColliderShape, PolygonShape, ShapeKind};
pub use material::MaterialStore;
pub use rigidbody::{BodyDesc, BodyFlags, RigidBody};
pub use types::{Aabb, Axis, Material, MaterialPairProperties};
