//! The player: movement, gates, levers and damage.
//!
//! The gate flags the rest of the game asks about (`can_move`, `can_press`,
//! `is_safe`, `can_load_next_scene`) are not stored independently. They are
//! views over a [`PlayerMode`] and two overlap counters, so impossible
//! combinations such as "transitioning but able to move" cannot be
//! represented.
//!
//! Mode transitions:
//!
//! | from        | to            | trigger                           |
//! |-------------|---------------|-----------------------------------|
//! | `FadingIn`  | `Active`      | fade-in completed                 |
//! | `FadingIn`  | `Dead`        | last life lost                    |
//! | `Active`    | `Transitioning` | open exit reached               |
//! | `Active`    | `Dead`        | last life lost                    |
//!
//! `Transitioning` and `Dead` are terminal for the session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use spectre_physics::{BodyId, PhysicsWorld, Velocity};

use crate::config::GameConfig;
use crate::input::FrameInput;
use crate::movement::{velocity_along, Facing};
use crate::puzzle::{LeverId, LeverTracker};

/// Lifecycle of the player within one level session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerMode {
    /// Camera fading in; frozen.
    FadingIn,
    /// Under player control.
    Active,
    /// Exit reached; frozen while the scene fades out.
    Transitioning,
    /// Out of lives; frozen.
    Dead,
}

impl PlayerMode {
    fn can_become(self, to: PlayerMode) -> bool {
        matches!(
            (self, to),
            (PlayerMode::FadingIn, PlayerMode::Active)
                | (PlayerMode::FadingIn, PlayerMode::Dead)
                | (PlayerMode::Active, PlayerMode::Transitioning)
                | (PlayerMode::Active, PlayerMode::Dead)
        )
    }
}

/// What the sprite is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    Walking(Facing),
    Stopped,
}

/// Why a hit did not take a life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Standing in a safe zone.
    Safe,
    /// Already transitioning or dead.
    Ignored,
    /// A life was taken.
    Hurt { remaining: u32 },
    /// The last life was taken.
    Died,
}

/// Player state. Created on level load, mutated only through its methods.
#[derive(Debug, Clone)]
pub struct Player {
    body: BodyId,
    life: u32,
    mode: PlayerMode,
    facing: Facing,
    animation: Animation,
    lever_overlaps: BTreeSet<LeverId>,
    safe_overlaps: u32,
    exit_door: Option<BodyId>,
}

impl Player {
    /// A player frozen for the level's fade-in.
    pub fn new(body: BodyId, life: u32) -> Self {
        Self {
            body,
            life,
            mode: PlayerMode::FadingIn,
            facing: Facing::DownRight,
            animation: Animation::Stopped,
            lever_overlaps: BTreeSet::new(),
            safe_overlaps: 0,
            exit_door: None,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn life(&self) -> u32 {
        self.life
    }

    pub fn mode(&self) -> PlayerMode {
        self.mode
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn animation(&self) -> Animation {
        self.animation
    }

    /// Animation key for the presentation layer, `None` while stopped.
    pub fn animation_key(&self) -> Option<String> {
        match self.animation {
            Animation::Walking(f) => Some(format!("player-{}", f.as_str())),
            Animation::Stopped => None,
        }
    }

    /// The exit door this player is heading for, if the level has one.
    pub fn exit_door(&self) -> Option<BodyId> {
        self.exit_door
    }

    pub fn set_exit_door(&mut self, door: Option<BodyId>) {
        self.exit_door = door;
    }

    pub fn can_move(&self) -> bool {
        self.mode == PlayerMode::Active
    }

    pub fn can_press(&self) -> bool {
        !self.lever_overlaps.is_empty()
    }

    pub fn is_safe(&self) -> bool {
        self.safe_overlaps > 0
    }

    pub fn can_load_next_scene(&self) -> bool {
        self.mode == PlayerMode::Transitioning
    }

    pub fn is_dead(&self) -> bool {
        self.mode == PlayerMode::Dead
    }

    // -- mode ---------------------------------------------------------------

    fn become_(&mut self, to: PlayerMode) -> bool {
        if !self.mode.can_become(to) {
            tracing::debug!(from = ?self.mode, ?to, "player mode change refused");
            return false;
        }
        tracing::debug!(from = ?self.mode, ?to, "player mode");
        self.mode = to;
        true
    }

    /// Hand control to the player once the fade-in is over.
    pub fn finish_fade_in(&mut self) -> bool {
        self.become_(PlayerMode::Active)
    }

    /// Enter the exit transition. Refused unless the player is active, so a
    /// second overlap with the exit cannot restart it.
    pub fn begin_transition(&mut self, physics: &mut PhysicsWorld) -> bool {
        if !self.become_(PlayerMode::Transitioning) {
            return false;
        }
        self.stop_player_movement(physics);
        true
    }

    // -- movement -----------------------------------------------------------

    /// Map this frame's directional keys to a velocity and animation.
    ///
    /// Without input, or while the player may not move, the body is forced
    /// to a standstill instead.
    pub fn check_player_inputs(
        &mut self,
        input: Option<&FrameInput>,
        physics: &mut PhysicsWorld,
        config: &GameConfig,
    ) {
        let Some(input) = input.filter(|_| self.can_move()) else {
            self.stop_player_movement(physics);
            return;
        };

        let (x, y) = input.held.axes();
        match Facing::from_axes(x, y) {
            Some(facing) => {
                self.facing = facing;
                self.animation = Animation::Walking(facing);
                physics.set_velocity(
                    self.body,
                    velocity_along(facing, config.walk_speed, config.orientation_offset),
                );
            }
            None => {
                self.animation = Animation::Stopped;
                physics.set_velocity(self.body, Velocity::ZERO);
            }
        }
    }

    /// Zero the velocity and stop the walk animation.
    pub fn stop_player_movement(&mut self, physics: &mut PhysicsWorld) {
        physics.set_velocity(self.body, Velocity::ZERO);
        self.animation = Animation::Stopped;
    }

    // -- interaction --------------------------------------------------------

    /// Press the first unpressed lever the player is standing on when the
    /// action key goes down. Returns the lever that changed, if any.
    pub fn use_button(&self, input: &FrameInput, levers: &mut LeverTracker) -> Option<LeverId> {
        if !self.can_press() || !self.can_move() || !input.action_pressed {
            return None;
        }
        self.lever_overlaps
            .iter()
            .copied()
            .find(|&id| levers.press(id))
    }

    pub fn enter_lever(&mut self, lever: LeverId) {
        self.lever_overlaps.insert(lever);
    }

    pub fn leave_lever(&mut self, lever: LeverId) {
        self.lever_overlaps.remove(&lever);
    }

    pub fn enter_safe_zone(&mut self) {
        self.safe_overlaps += 1;
    }

    pub fn leave_safe_zone(&mut self) {
        self.safe_overlaps = self.safe_overlaps.saturating_sub(1);
    }

    // -- damage -------------------------------------------------------------

    /// Take `amount` lives unless protected. Reaching zero kills the player
    /// and stops it in place.
    pub fn apply_damage(&mut self, amount: u32, physics: &mut PhysicsWorld) -> DamageOutcome {
        if matches!(self.mode, PlayerMode::Transitioning | PlayerMode::Dead) {
            return DamageOutcome::Ignored;
        }
        if self.is_safe() {
            tracing::debug!("hit absorbed by safe zone");
            return DamageOutcome::Safe;
        }
        self.life = self.life.saturating_sub(amount);
        if self.life == 0 {
            self.become_(PlayerMode::Dead);
            self.stop_player_movement(physics);
            DamageOutcome::Died
        } else {
            DamageOutcome::Hurt {
                remaining: self.life,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;
    use spectre_physics::{BodyDesc, BodyKind, ColliderShape, Position};

    fn setup() -> (PhysicsWorld, Player) {
        let mut physics = PhysicsWorld::new_zero_gravity();
        let body = physics
            .spawn(
                &BodyDesc::solid(BodyKind::Dynamic, ColliderShape::Circle { radius: 8.0 }),
                Position::default(),
            )
            .unwrap();
        (physics, Player::new(body, 3))
    }

    fn frame(held: InputState) -> FrameInput {
        FrameInput {
            held,
            action_pressed: held.action,
            pause_pressed: false,
        }
    }

    #[test]
    fn frozen_during_fade_in() {
        let (mut physics, mut player) = setup();
        let config = GameConfig::default();
        let right = frame(InputState {
            right: true,
            ..Default::default()
        });

        player.check_player_inputs(Some(&right), &mut physics, &config);
        assert_eq!(physics.velocity(player.body()), Some(Velocity::ZERO));
        assert_eq!(player.animation(), Animation::Stopped);

        assert!(player.finish_fade_in());
        player.check_player_inputs(Some(&right), &mut physics, &config);
        let v = physics.velocity(player.body()).unwrap();
        assert!((v.dx - config.walk_speed).abs() < 1e-3);
        assert_eq!(player.animation_key().as_deref(), Some("player-right"));
    }

    #[test]
    fn no_input_forces_idle() {
        let (mut physics, mut player) = setup();
        let config = GameConfig::default();
        player.finish_fade_in();
        physics.set_velocity(player.body(), Velocity::new(50.0, 0.0));

        player.check_player_inputs(None, &mut physics, &config);
        assert_eq!(physics.velocity(player.body()), Some(Velocity::ZERO));
    }

    #[test]
    fn release_keys_stops_but_keeps_facing() {
        let (mut physics, mut player) = setup();
        let config = GameConfig::default();
        player.finish_fade_in();
        let up_left = frame(InputState {
            up: true,
            left: true,
            ..Default::default()
        });
        player.check_player_inputs(Some(&up_left), &mut physics, &config);
        player.check_player_inputs(Some(&frame(InputState::default())), &mut physics, &config);

        assert_eq!(player.facing(), Facing::UpLeft);
        assert_eq!(player.animation(), Animation::Stopped);
        assert_eq!(physics.velocity(player.body()), Some(Velocity::ZERO));
    }

    #[test]
    fn safe_zone_blocks_damage() {
        let (mut physics, mut player) = setup();
        player.enter_safe_zone();
        assert_eq!(player.apply_damage(1, &mut physics), DamageOutcome::Safe);
        assert_eq!(player.life(), 3);

        player.leave_safe_zone();
        assert_eq!(
            player.apply_damage(1, &mut physics),
            DamageOutcome::Hurt { remaining: 2 }
        );
    }

    #[test]
    fn overlapping_safe_zones_need_both_left() {
        let (mut physics, mut player) = setup();
        player.enter_safe_zone();
        player.enter_safe_zone();
        player.leave_safe_zone();
        assert!(player.is_safe());
        player.leave_safe_zone();
        player.leave_safe_zone();
        assert!(!player.is_safe());
        assert!(matches!(
            player.apply_damage(1, &mut physics),
            DamageOutcome::Hurt { .. }
        ));
    }

    #[test]
    fn last_life_kills_and_further_hits_are_ignored() {
        let (mut physics, mut player) = setup();
        player.finish_fade_in();
        assert_eq!(player.apply_damage(5, &mut physics), DamageOutcome::Died);
        assert!(player.is_dead());
        assert!(!player.can_move());
        assert_eq!(player.apply_damage(1, &mut physics), DamageOutcome::Ignored);
        assert_eq!(player.life(), 0);
    }

    #[test]
    fn transition_freezes_and_is_one_shot() {
        let (mut physics, mut player) = setup();
        player.finish_fade_in();
        physics.set_velocity(player.body(), Velocity::new(10.0, 10.0));

        assert!(player.begin_transition(&mut physics));
        assert!(player.can_load_next_scene());
        assert!(!player.can_move());
        assert_eq!(physics.velocity(player.body()), Some(Velocity::ZERO));
        assert!(!player.begin_transition(&mut physics));
        assert_eq!(player.apply_damage(1, &mut physics), DamageOutcome::Ignored);
    }

    #[test]
    fn transition_refused_while_fading_in() {
        let (mut physics, mut player) = setup();
        assert!(!player.begin_transition(&mut physics));
        assert_eq!(player.mode(), PlayerMode::FadingIn);
    }

    #[test]
    fn use_button_needs_overlap_and_fresh_press() {
        let (_physics, mut player) = setup();
        player.finish_fade_in();
        let mut levers = LeverTracker::new();
        let lever = levers.add(BodyId::new(40, 0));
        let press = frame(InputState {
            action: true,
            ..Default::default()
        });

        assert_eq!(player.use_button(&press, &mut levers), None);
        player.enter_lever(lever);
        assert!(player.can_press());
        assert_eq!(player.use_button(&press, &mut levers), Some(lever));
        assert_eq!(player.use_button(&press, &mut levers), None, "already pressed");

        player.leave_lever(lever);
        assert!(!player.can_press());
    }
}
