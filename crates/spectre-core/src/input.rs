//! Polled input.
//!
//! The host samples the device once per frame into an [`InputState`]. The
//! [`InputTracker`] turns the action and pause keys into rising edges so a
//! held key interacts once.

use serde::{Deserialize, Serialize};

/// Raw key state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Interact / attack.
    pub action: bool,
    pub pause: bool,
}

impl InputState {
    /// Directional axes in screen orientation: `x` right, `y` down. Opposite
    /// keys cancel out.
    pub fn axes(&self) -> (i8, i8) {
        let x = self.right as i8 - self.left as i8;
        let y = self.down as i8 - self.up as i8;
        (x, y)
    }
}

/// One frame of input with edges resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Keys held this frame.
    pub held: InputState,
    /// The action key went down this frame.
    pub action_pressed: bool,
    /// The pause key went down this frame.
    pub pause_pressed: bool,
}

/// Remembers the previous frame to detect key presses.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    previous: InputState,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this frame's state. A missing device counts as nothing held, so
    /// the next real sample still produces fresh edges.
    pub fn advance(&mut self, state: Option<&InputState>) -> Option<FrameInput> {
        let Some(&held) = state else {
            self.previous = InputState::default();
            return None;
        };
        let frame = FrameInput {
            held,
            action_pressed: held.action && !self.previous.action,
            pause_pressed: held.pause && !self.previous.pause,
        };
        self.previous = held;
        Some(frame)
    }
}
