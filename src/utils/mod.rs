//! Utility helpers: slot pools, 2D math extensions, and logging.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, EntityId};
pub use math::*;
