//! What a frame tells the outside world.
//!
//! The core never calls into the presentation or audio layers. It appends
//! [`SessionEvent`]s to an outbox during the frame and hands them over in a
//! [`FrameReport`] once the frame is done.

use serde::{Deserialize, Serialize};

use crate::boss::BossPhase;
use crate::enemy::{EnemyId, EnemyState};
use crate::puzzle::{DoorRole, LeverId};
use crate::scene::{FadeKind, TransitionPayload};

/// Discrete audio cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    /// Level music, started on level entry.
    AmbientLoop,
    BossMusicStart,
    BossMusicStop,
}

/// Something that happened during a frame, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LevelEntered { level: i32, lives: u32 },
    Audio { cue: AudioCue },
    LifeChanged { remaining: u32 },
    PlayerDied { level: i32 },
    LeverPressed { lever: LeverId, pressed: usize, total: usize },
    DoorOpened { door: DoorRole },
    DoorClosed { door: DoorRole },
    EnemyStateChanged { enemy: EnemyId, from: EnemyState, to: EnemyState },
    EnemyDied { enemy: EnemyId },
    BossPhaseChanged { from: BossPhase, to: BossPhase },
    BossDamaged { health: u32 },
    FadeStarted { fade: FadeKind },
    FadeCompleted { fade: FadeKind },
    /// The scene host should switch scenes now.
    TransitionRequested { payload: TransitionPayload },
    Paused,
    Resumed,
}

/// Everything one call to the frame loop produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Tick number after this frame (the first frame reports 1).
    pub tick: u64,
    pub events: Vec<SessionEvent>,
    /// Set on the single frame whose fade-out completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionPayload>,
}

impl FrameReport {
    /// Nothing worth reporting happened.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.transition.is_none()
    }
}
