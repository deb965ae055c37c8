//! Spectre Physics -- rapier2d world addressed by generational body handles.
//!
//! The gameplay core never sees rapier types. It spawns bodies from
//! [`BodyDesc`] values, steers them through velocities, swaps door colliders
//! in place, and reads back a deterministic [`Contact`] stream every step.
//!
//! # Quick Start
//!
//! ```
//! use spectre_physics::prelude::*;
//!
//! let mut world = PhysicsWorld::new_zero_gravity();
//! let lever = world
//!     .spawn(
//!         &BodyDesc::sensor(BodyKind::Static, ColliderShape::Circle { radius: 8.0 }),
//!         Position::new(64.0, 32.0),
//!     )
//!     .unwrap();
//!
//! assert!(world.has_body(lever));
//! assert_eq!(world.is_sensor(lever), Some(true));
//! assert!(world.step(1.0 / 60.0).is_empty());
//! ```

#![deny(unsafe_code)]

pub mod body;
pub mod world;

pub use body::{BodyAllocator, BodyId};
pub use world::{
    BodyDesc, BodyKind, ColliderShape, Contact, ContactPhase, PhysicsWorld, Position, Velocity,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by physics world operations.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// A polygon collider could not be turned into a convex hull.
    #[error("degenerate polygon collider with {vertices} vertices")]
    DegenerateShape {
        /// Number of vertices supplied.
        vertices: usize,
    },

    /// The body handle is stale or was never allocated.
    #[error("body {0} does not exist (stale or never spawned)")]
    UnknownBody(BodyId),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::body::BodyId;
    pub use crate::world::{
        BodyDesc, BodyKind, ColliderShape, Contact, ContactPhase, PhysicsWorld, Position,
        Velocity,
    };
    pub use crate::PhysicsError;
}
