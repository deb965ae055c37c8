//! Spectre Core -- gameplay core of an isometric action-puzzle game.
//!
//! This crate builds on [`spectre_physics`] to run one level at a time: the
//! player's 8-way isometric movement and gates, lever puzzles and doors,
//! phantom AI, the boss fight, and the fade-gated transition to the next
//! scene. Presentation and audio are outside; they consume the
//! [`SessionEvent`](events::SessionEvent)s, [`Hud`](session::Hud) and
//! [`render_order`](session::Session::render_order) this crate produces.
//!
//! # Quick Start
//!
//! ```
//! use spectre_core::prelude::*;
//!
//! let level = LevelDescriptor::from_json_str(r#"{
//!     "spawn_point": [0, 0],
//!     "shapes": {
//!         "player": { "type": "circle", "radius": 8 },
//!         "closed": { "type": "box", "half_width": 16, "half_height": 8 },
//!         "open": { "type": "box", "half_width": 12, "half_height": 4 }
//!     },
//!     "exit": { "position": [300, 0] }
//! }"#).unwrap();
//!
//! let session = Session::build(&level, GameConfig::default(), SessionEntry::new(1)).unwrap();
//! // No levers: the exit is open from the start.
//! assert!(session.exit().unwrap().is_open());
//! assert_eq!(session.hud().life, 3);
//! ```

#![deny(unsafe_code)]

pub mod boss;
pub mod collision;
pub mod config;
pub mod enemy;
pub mod events;
pub mod frame;
pub mod input;
pub mod iso;
pub mod level;
pub mod movement;
pub mod player;
pub mod puzzle;
pub mod scene;
pub mod session;

/// Re-export the physics crate for convenience.
pub use spectre_physics;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while setting a level up.
///
/// Gameplay itself never fails: missing references, unknown contact pairs
/// and repeated triggers degrade to "freeze or ignore" with a log line.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A body could not be created.
    #[error(transparent)]
    Physics(#[from] spectre_physics::PhysicsError),

    /// A config or level document is not valid JSON for its type.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The level references a collider shape it does not define.
    #[error("level references unknown shape `{key}`")]
    UnknownShape {
        /// The missing key.
        key: String,
    },

    /// The configuration violates a cross-field constraint.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use spectre_physics::prelude::*;

    pub use crate::boss::{Boss, BossPhase};
    pub use crate::collision::{classify, BodyLabel, LabelKind, PairRule};
    pub use crate::config::{AttackConfig, BossConfig, EnemyKind, EnemyStats, GameConfig};
    pub use crate::enemy::{Enemy, EnemyId, EnemyState};
    pub use crate::events::{AudioCue, FrameReport, SessionEvent};
    pub use crate::frame::{FrameDiagnostics, FrameLoop};
    pub use crate::input::{FrameInput, InputState, InputTracker};
    pub use crate::level::LevelDescriptor;
    pub use crate::movement::Facing;
    pub use crate::player::{Player, PlayerMode};
    pub use crate::puzzle::{Door, DoorRole, LeverId, LeverTracker};
    pub use crate::scene::{SceneTarget, TransitionPayload};
    pub use crate::session::{Hud, Session, SessionEntry};
    pub use crate::GameError;
}
