//! Fixed-timestep frame loop.
//!
//! The [`FrameLoop`] drives a [`Session`] one fixed step at a time. Every
//! frame runs the same phases in the same order:
//!
//! 1. Pause edge. A paused frame stops here.
//! 2. Physics step.
//! 3. Contact dispatch, so collisions are visible to the rest of the frame.
//! 4. Player input, lever use and attack.
//! 5. Enemy AI.
//! 6. Boss AI.
//! 7. Hit-box expiry.
//! 8. Scene fades, which may release the transition payload.
//!
//! With a fixed phase order, sorted contacts and a seeded RNG, the same
//! level and the same input script always produce the same reports.
//!
//! # Example
//!
//! ```
//! use spectre_core::prelude::*;
//!
//! let level = LevelDescriptor::from_json_str(r#"{
//!     "spawn_point": [0, 0],
//!     "shapes": { "player": { "type": "circle", "radius": 8 } }
//! }"#).unwrap();
//! let session = Session::build(&level, GameConfig::default(), SessionEntry::new(0)).unwrap();
//! let mut frames = FrameLoop::new(session);
//!
//! for _ in 0..10 {
//!     frames.tick(Some(&InputState::default()));
//! }
//! assert_eq!(frames.tick_count(), 10);
//! ```

use std::time::{Duration, Instant};

use crate::events::{FrameReport, SessionEvent};
use crate::input::{InputState, InputTracker};
use crate::session::Session;

/// Wall-clock timings of the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Time per phase, in execution order.
    pub phase_times: Vec<(&'static str, Duration)>,
    /// Whole frame.
    pub total_time: Duration,
    /// Contacts dispatched this frame.
    pub contacts: usize,
}

/// Runs a session frame by frame.
#[derive(Debug)]
pub struct FrameLoop {
    session: Session,
    input: InputTracker,
    tick_counter: u64,
    fixed_dt: f64,
    paused: bool,
    last_diagnostics: FrameDiagnostics,
}

impl FrameLoop {
    pub fn new(session: Session) -> Self {
        let fixed_dt = session.config().fixed_dt;
        Self {
            session,
            input: InputTracker::new(),
            tick_counter: 0,
            fixed_dt,
            paused: false,
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Run one frame with this frame's polled input (`None` when no device
    /// is available).
    pub fn tick(&mut self, input: Option<&InputState>) -> FrameReport {
        let frame_start = Instant::now();
        let mut phases = Vec::with_capacity(7);
        let frame = self.input.advance(input);
        self.tick_counter += 1;

        if frame.is_some_and(|f| f.pause_pressed) {
            self.paused = !self.paused;
            tracing::debug!(paused = self.paused, tick = self.tick_counter, "pause toggled");
        }
        let mut events = self.session.drain_events();
        if frame.is_some_and(|f| f.pause_pressed) {
            events.push(if self.paused {
                SessionEvent::Paused
            } else {
                SessionEvent::Resumed
            });
        }
        if self.paused {
            self.last_diagnostics = FrameDiagnostics {
                phase_times: phases,
                total_time: frame_start.elapsed(),
                contacts: 0,
            };
            return FrameReport {
                tick: self.tick_counter,
                events,
                transition: None,
            };
        }

        let t = Instant::now();
        let contacts = self.session.step_physics();
        phases.push(("physics", t.elapsed()));

        let contact_count = contacts.len();
        let t = Instant::now();
        for contact in contacts {
            self.session.dispatch_contact(contact);
        }
        phases.push(("contacts", t.elapsed()));

        let t = Instant::now();
        self.session.update_player(frame.as_ref());
        phases.push(("player", t.elapsed()));

        let t = Instant::now();
        self.session.update_enemies();
        phases.push(("enemies", t.elapsed()));

        let t = Instant::now();
        self.session.update_boss();
        phases.push(("boss", t.elapsed()));

        let t = Instant::now();
        self.session.expire_hitboxes();
        phases.push(("hitboxes", t.elapsed()));

        let t = Instant::now();
        let transition = self.session.advance_scene();
        phases.push(("scene", t.elapsed()));

        events.extend(self.session.drain_events());
        self.last_diagnostics = FrameDiagnostics {
            phase_times: phases,
            total_time: frame_start.elapsed(),
            contacts: contact_count,
        };
        FrameReport {
            tick: self.tick_counter,
            events,
            transition,
        }
    }

    /// Number of frames run so far, paused ones included.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds, computed from the tick count rather than summed.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }
}
