//! Level progression and camera fades.
//!
//! A transition is a strict sequence: the player is frozen, a fade-out runs
//! for a fixed number of frames, and only then is the payload handed to the
//! scene host. Once a fade-out has started nothing in gameplay can cancel or
//! restart it; only dropping the session does.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::events::SessionEvent;

/// Scene the host should load next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneTarget {
    #[serde(rename = "game")]
    Game,
    #[serde(rename = "OutroScreen")]
    Outro,
    #[serde(rename = "GameOver")]
    GameOver,
}

impl SceneTarget {
    /// Scene key as registered with the host.
    pub fn key(self) -> &'static str {
        match self {
            SceneTarget::Game => "game",
            SceneTarget::Outro => "OutroScreen",
            SceneTarget::GameOver => "GameOver",
        }
    }
}

/// Handed to the scene host on a completed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPayload {
    pub target_scene: SceneTarget,
    /// Level to load; `-1` when leaving the game scenes.
    pub level: i32,
    pub remaining_life: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeKind {
    In,
    Out,
}

/// A running fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fade {
    pub kind: FadeKind,
    remaining: u32,
    total: u32,
}

impl Fade {
    fn new(kind: FadeKind, ticks: u32) -> Self {
        Self {
            kind,
            remaining: ticks,
            total: ticks,
        }
    }

    /// Fraction completed, `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            1.0 - self.remaining as f64 / self.total as f64
        }
    }
}

/// What advancing the scene produced this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStep {
    Idle,
    /// The fade-in finished; control can go to the player.
    FadeInDone,
    /// The fade-out finished; the payload has been released.
    Transition(TransitionPayload),
}

/// Owns the level index and the pending transition.
#[derive(Debug, Clone)]
pub struct SceneManager {
    level: i32,
    last_level: i32,
    max_lives: u32,
    fade: Option<Fade>,
    pending: Option<TransitionPayload>,
    released: bool,
}

impl SceneManager {
    pub fn new(level: i32, config: &GameConfig) -> Self {
        Self {
            level,
            last_level: config.last_level,
            max_lives: config.max_lives,
            fade: None,
            pending: None,
            released: false,
        }
    }

    /// Life to start a level with. Whatever the previous scene carried over
    /// is clamped to `1..=max_lives`; nothing or zero means a fresh start.
    pub fn entry_life(carried: Option<u32>, max_lives: u32) -> u32 {
        match carried {
            Some(0) | None => max_lives,
            Some(life) => life.min(max_lives),
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn fade(&self) -> Option<&Fade> {
        self.fade.as_ref()
    }

    /// A fade-out is running or has already released its payload.
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some() || self.released
    }

    /// Payload for clearing the current level.
    pub fn level_cleared(&self, life: u32) -> TransitionPayload {
        if self.level >= self.last_level {
            TransitionPayload {
                target_scene: SceneTarget::Outro,
                level: -1,
                remaining_life: self.max_lives,
            }
        } else {
            TransitionPayload {
                target_scene: SceneTarget::Game,
                level: self.level + 1,
                remaining_life: life,
            }
        }
    }

    /// Payload for running out of lives.
    pub fn game_over(&self) -> TransitionPayload {
        TransitionPayload {
            target_scene: SceneTarget::GameOver,
            level: self.level,
            remaining_life: 0,
        }
    }

    pub fn start_fade_in(&mut self, ticks: u32, events: &mut Vec<SessionEvent>) {
        self.fade = Some(Fade::new(FadeKind::In, ticks));
        events.push(SessionEvent::FadeStarted { fade: FadeKind::In });
    }

    /// Start the fade-out that ends in `payload`. Refused if a transition is
    /// already under way; the first request wins.
    pub fn request_transition(
        &mut self,
        payload: TransitionPayload,
        ticks: u32,
        events: &mut Vec<SessionEvent>,
    ) -> bool {
        if self.is_transitioning() {
            tracing::debug!(?payload, "transition already under way; request dropped");
            return false;
        }
        tracing::info!(
            scene = payload.target_scene.key(),
            level = payload.level,
            life = payload.remaining_life,
            "fading out"
        );
        self.pending = Some(payload);
        self.fade = Some(Fade::new(FadeKind::Out, ticks));
        events.push(SessionEvent::FadeStarted { fade: FadeKind::Out });
        true
    }

    /// Count the running fade down by one frame.
    pub fn advance(&mut self, events: &mut Vec<SessionEvent>) -> SceneStep {
        let Some(fade) = self.fade.as_mut() else {
            return SceneStep::Idle;
        };
        fade.remaining = fade.remaining.saturating_sub(1);
        if fade.remaining > 0 {
            return SceneStep::Idle;
        }

        let kind = fade.kind;
        self.fade = None;
        events.push(SessionEvent::FadeCompleted { fade: kind });
        match kind {
            FadeKind::In => SceneStep::FadeInDone,
            FadeKind::Out => match self.pending.take() {
                Some(payload) => {
                    self.released = true;
                    events.push(SessionEvent::TransitionRequested { payload });
                    SceneStep::Transition(payload)
                }
                None => SceneStep::Idle,
            },
        }
    }
}
