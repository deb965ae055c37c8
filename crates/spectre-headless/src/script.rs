//! Scripted input.
//!
//! A script is a JSON array of steps, each holding one input state for a
//! number of frames. An omitted `input` means nothing is pressed; an explicit
//! `null` simulates a missing input device.
//!
//! ```json
//! [
//!   { "frames": 120 },
//!   { "frames": 40, "input": { "right": true } },
//!   { "frames": 1, "input": { "action": true } },
//!   { "frames": 5, "input": null }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use spectre_core::input::InputState;

fn nothing_pressed() -> Option<InputState> {
    Some(InputState::default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub frames: u32,
    #[serde(default = "nothing_pressed")]
    pub input: Option<InputState>,
}

/// Frame-by-frame view of a script.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    steps: Vec<ScriptStep>,
    step: usize,
    used: u32,
}

impl InputScript {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            step: 0,
            used: 0,
        }
    }

    /// Input for the next frame. Once the script is exhausted nothing is
    /// pressed.
    pub fn next_frame(&mut self) -> Option<InputState> {
        while let Some(step) = self.steps.get(self.step) {
            if self.used < step.frames {
                self.used += 1;
                return step.input;
            }
            self.step += 1;
            self.used = 0;
        }
        Some(InputState::default())
    }

    /// Scripted frames not yet played.
    pub fn remaining_frames(&self) -> u64 {
        let left: u64 = self.steps.iter().skip(self.step).map(|s| u64::from(s.frames)).sum();
        left.saturating_sub(u64::from(self.used))
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_frames() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_play_in_order() {
        let mut script = InputScript::from_json_str(
            r#"[
                { "frames": 2, "input": { "right": true } },
                { "frames": 0, "input": { "up": true } },
                { "frames": 1, "input": null }
            ]"#,
        )
        .unwrap();

        assert!(script.next_frame().unwrap().right);
        assert!(script.next_frame().unwrap().right);
        assert_eq!(script.next_frame(), None);
        assert!(script.is_finished());
        assert_eq!(script.next_frame(), Some(InputState::default()));
    }

    #[test]
    fn omitted_input_means_idle() {
        let mut script = InputScript::from_json_str(r#"[ { "frames": 1 } ]"#).unwrap();
        assert!(!script.is_finished());
        assert_eq!(script.next_frame(), Some(InputState::default()));
    }
}
