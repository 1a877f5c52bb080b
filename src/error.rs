//! Error types shared by every pool and world operation.

use thiserror::Error;

/// Physics engine errors.
///
/// Pool exhaustion and handle misuse are contract violations: the caller is
/// expected to size the world correctly and never hold on to freed handles.
/// They are surfaced as values so the host decides whether to abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// A fixed-capacity pool has no free slot left.
    #[error("{pool} pool exhausted (capacity {capacity})")]
    CapacityExhausted { pool: &'static str, capacity: usize },

    /// Handle index outside the allocated range of the pool.
    #[error("invalid {pool} handle: index {index} >= high water mark {high_water}")]
    InvalidHandle {
        pool: &'static str,
        index: u32,
        high_water: u32,
    },

    /// Handle refers to a slot that was freed (and possibly reused) since it was issued.
    #[error("stale {pool} handle: index {index}, generation {generation}")]
    StaleHandle {
        pool: &'static str,
        index: u32,
        generation: u32,
    },

    /// The free list handed out a slot that is still occupied.
    #[error("{pool} slot {index} is still in use (free list corrupted)")]
    SlotInUse { pool: &'static str, index: u32 },

    /// Shape parameters cannot describe a convex collider.
    #[error("degenerate collider shape: {0}")]
    DegenerateShape(String),

    /// World configuration rejected.
    #[error("invalid world configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for physics operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;
