//! Phantom AI.
//!
//! Every phantom runs the same state machine; its colour only selects the
//! [`EnemyStats`] it is driven with.
//!
//! ```text
//! Idle --delay--> Patrol --detect--> Chase --melee--> Attack
//!                   ^                  |  ^-----------'  |
//!                   '------leave-------'-----------------'
//! any live state --hit--> Stagger --timer--> Chase | Patrol
//! any live state --health 0--> Dead
//! ```
//!
//! Distances are measured on the ground plane (see [`iso_distance`]) so a
//! phantom notices the player equally far away along every grid direction.

use rand::Rng;
use serde::{Deserialize, Serialize};
use spectre_physics::{BodyId, PhysicsWorld, Position, Velocity};

use crate::config::{EnemyKind, EnemyStats};
use crate::iso::iso_distance;
use crate::movement::{velocity_along, velocity_towards, Facing};

/// Slot of an enemy in the session's enemy list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

impl std::fmt::Display for EnemyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enemy#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyState {
    Idle,
    Patrol,
    Chase,
    Attack,
    Stagger,
    Dead,
}

impl EnemyState {
    /// Whether `self -> to` is an edge of the state machine.
    pub fn can_become(self, to: EnemyState) -> bool {
        use EnemyState::*;
        match (self, to) {
            (Dead, _) => false,
            (_, Dead) | (_, Stagger) => true,
            (Idle, Patrol)
            | (Patrol, Chase)
            | (Chase, Attack)
            | (Attack, Chase)
            | (Chase, Patrol)
            | (Attack, Patrol)
            | (Stagger, Chase)
            | (Stagger, Patrol) => true,
            _ => false,
        }
    }
}

/// Result of a player hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyHit {
    /// The enemy is already dead.
    Dropped,
    Staggered { from: EnemyState, health: u32 },
    Killed { from: EnemyState },
}

/// One phantom.
#[derive(Debug, Clone)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    body: BodyId,
    /// Non-owning handle on the body being chased.
    target: Option<BodyId>,
    health: u32,
    state: EnemyState,
    /// Frames left in the current timed state (idle, patrol leg, stagger).
    timer: u32,
    heading: Facing,
    facing: Facing,
    moving: bool,
}

impl Enemy {
    pub fn new(id: EnemyId, kind: EnemyKind, body: BodyId, target: Option<BodyId>, stats: &EnemyStats) -> Self {
        Self {
            id,
            kind,
            body,
            target,
            health: stats.health,
            state: EnemyState::Idle,
            timer: stats.idle_ticks,
            heading: Facing::Down,
            facing: Facing::Down,
            moving: false,
        }
    }

    pub fn id(&self) -> EnemyId {
        self.id
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// `"<kind>-<facing>"` while moving, `"<kind>-idle"` otherwise.
    pub fn animation_key(&self) -> String {
        if self.moving {
            format!("{}-{}", self.kind.as_str(), self.facing.as_str())
        } else {
            format!("{}-idle", self.kind.as_str())
        }
    }

    fn become_(&mut self, to: EnemyState) -> Option<(EnemyState, EnemyState)> {
        let from = self.state;
        if from == to || !from.can_become(to) {
            return None;
        }
        tracing::debug!(enemy = %self.id, ?from, ?to, "enemy state");
        self.state = to;
        Some((from, to))
    }

    fn drive(&mut self, physics: &mut PhysicsWorld, velocity: Velocity) {
        physics.set_velocity(self.body, velocity);
        match Facing::from_vector(velocity.dx, velocity.dy) {
            Some(facing) => {
                self.facing = facing;
                self.moving = true;
            }
            None => self.moving = false,
        }
    }

    fn start_patrol_leg<R: Rng + ?Sized>(&mut self, stats: &EnemyStats, rng: &mut R) {
        self.heading = Facing::ALL[rng.gen_range(0..Facing::ALL.len())];
        self.timer = stats.patrol_turn_ticks.max(1);
    }

    /// Advance the AI by one frame. Returns the transition taken, if any.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        physics: &mut PhysicsWorld,
        stats: &EnemyStats,
        orientation_offset: f64,
        rng: &mut R,
    ) -> Option<(EnemyState, EnemyState)> {
        let Some(me) = physics.position(self.body) else {
            tracing::warn!(enemy = %self.id, body = %self.body, "enemy body missing; skipping update");
            return None;
        };
        let distance = self
            .target
            .and_then(|t| physics.position(t))
            .map(|target| (target, iso_distance(me, target)));

        let transition = match self.state {
            EnemyState::Dead => return None,
            EnemyState::Idle => {
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0 {
                    self.start_patrol_leg(stats, rng);
                    self.become_(EnemyState::Patrol)
                } else {
                    None
                }
            }
            EnemyState::Patrol => match distance {
                Some((_, d)) if d <= stats.detection_radius => self.become_(EnemyState::Chase),
                _ => {
                    self.timer = self.timer.saturating_sub(1);
                    if self.timer == 0 {
                        self.start_patrol_leg(stats, rng);
                    }
                    None
                }
            },
            EnemyState::Chase => match distance {
                Some((_, d)) if d <= stats.melee_range => self.become_(EnemyState::Attack),
                Some((_, d)) if d <= stats.leave_radius => None,
                _ => self.lose_target(stats, rng),
            },
            EnemyState::Attack => match distance {
                Some((_, d)) if d <= stats.melee_range => None,
                Some((_, d)) if d <= stats.leave_radius => self.become_(EnemyState::Chase),
                _ => self.lose_target(stats, rng),
            },
            EnemyState::Stagger => {
                self.timer = self.timer.saturating_sub(1);
                if self.timer > 0 {
                    None
                } else {
                    match distance {
                        Some((_, d)) if d <= stats.leave_radius => self.become_(EnemyState::Chase),
                        _ => self.lose_target(stats, rng),
                    }
                }
            }
        };

        let velocity = match (self.state, distance) {
            (EnemyState::Patrol, _) => velocity_along(self.heading, stats.patrol_speed, orientation_offset),
            (EnemyState::Chase, Some((target, _))) => {
                velocity_towards(target.x - me.x, target.y - me.y, stats.chase_speed)
            }
            (EnemyState::Attack, Some((target, _))) => {
                velocity_towards(target.x - me.x, target.y - me.y, stats.attack_speed)
            }
            _ => Velocity::ZERO,
        };
        self.drive(physics, velocity);
        transition
    }

    fn lose_target<R: Rng + ?Sized>(
        &mut self,
        stats: &EnemyStats,
        rng: &mut R,
    ) -> Option<(EnemyState, EnemyState)> {
        self.start_patrol_leg(stats, rng);
        self.become_(EnemyState::Patrol)
    }

    /// Take a player hit. Dead enemies drop it; a stagger in progress is
    /// restarted.
    pub fn receive_hit(&mut self, damage: u32, stats: &EnemyStats, physics: &mut PhysicsWorld) -> EnemyHit {
        let from = self.state;
        if from == EnemyState::Dead {
            return EnemyHit::Dropped;
        }
        self.health = self.health.saturating_sub(damage);
        self.drive(physics, Velocity::ZERO);
        if self.health == 0 {
            self.become_(EnemyState::Dead);
            EnemyHit::Killed { from }
        } else {
            self.timer = stats.stagger_ticks.max(1);
            self.become_(EnemyState::Stagger);
            EnemyHit::Staggered {
                from,
                health: self.health,
            }
        }
    }

    /// Current position, if the body still exists.
    pub fn position(&self, physics: &PhysicsWorld) -> Option<Position> {
        physics.position(self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use spectre_physics::{BodyDesc, BodyKind, ColliderShape};

    struct Rig {
        physics: PhysicsWorld,
        enemy: Enemy,
        player: BodyId,
        stats: EnemyStats,
        rng: Pcg32,
    }

    impl Rig {
        fn new(player_at: Position) -> Self {
            let mut physics = PhysicsWorld::new_zero_gravity();
            let shape = ColliderShape::Circle { radius: 6.0 };
            let player = physics
                .spawn(&BodyDesc::sensor(BodyKind::Kinematic, shape.clone()), player_at)
                .unwrap();
            let body = physics
                .spawn(&BodyDesc::solid(BodyKind::Kinematic, shape), Position::default())
                .unwrap();
            let stats = crate::config::EnemyRoster::default().purple;
            let enemy = Enemy::new(EnemyId(0), EnemyKind::Purple, body, Some(player), &stats);
            Self {
                physics,
                enemy,
                player,
                stats,
                rng: Pcg32::seed_from_u64(7),
            }
        }

        fn tick(&mut self) -> Option<(EnemyState, EnemyState)> {
            self.enemy
                .update(&mut self.physics, &self.stats, 1.0, &mut self.rng)
        }

        /// Replace the chased body with one standing at `at`.
        fn retarget(&mut self, at: Position) {
            self.physics.despawn(self.player);
            self.player = self
                .physics
                .spawn(
                    &BodyDesc::sensor(BodyKind::Kinematic, ColliderShape::Circle { radius: 6.0 }),
                    at,
                )
                .unwrap();
            self.enemy.target = Some(self.player);
        }

        fn run_until(&mut self, state: EnemyState, max: u32) {
            for _ in 0..max {
                self.tick();
                if self.enemy.state() == state {
                    return;
                }
            }
            panic!("never reached {state:?}, stuck in {:?}", self.enemy.state());
        }
    }

    #[test]
    fn idles_then_patrols() {
        let mut rig = Rig::new(Position::new(5000.0, 5000.0));
        for _ in 0..rig.stats.idle_ticks - 1 {
            assert_eq!(rig.tick(), None);
        }
        assert_eq!(rig.tick(), Some((EnemyState::Idle, EnemyState::Patrol)));
        assert!(rig.physics.velocity(rig.enemy.body()).unwrap().speed() > 0.0);
    }

    #[test]
    fn detects_chases_and_attacks() {
        let mut rig = Rig::new(Position::new(100.0, 0.0));
        rig.run_until(EnemyState::Patrol, 100);
        assert_eq!(rig.tick(), Some((EnemyState::Patrol, EnemyState::Chase)));
        let v = rig.physics.velocity(rig.enemy.body()).unwrap();
        assert!(v.dx > 0.0, "chases towards the player");
        assert!((v.speed() - rig.stats.chase_speed).abs() < 1e-3);

        let me = rig.enemy.position(&rig.physics).unwrap();
        // Swap in a target already inside melee range.
        rig.physics.despawn(rig.player);
        let shape = ColliderShape::Circle { radius: 6.0 };
        let near = rig
            .physics
            .spawn(
                &BodyDesc::sensor(BodyKind::Kinematic, shape),
                Position::new(me.x + 10.0, me.y),
            )
            .unwrap();
        rig.enemy.target = Some(near);
        assert_eq!(rig.tick(), Some((EnemyState::Chase, EnemyState::Attack)));
    }

    #[test]
    fn gives_up_beyond_leave_radius() {
        let mut rig = Rig::new(Position::new(100.0, 0.0));
        rig.run_until(EnemyState::Chase, 200);
        rig.enemy.target = None;
        assert_eq!(rig.tick(), Some((EnemyState::Chase, EnemyState::Patrol)));
    }

    // Screen points on the x axis are `x / sqrt(2)` away on the ground, so
    // with purple stats (detect 160, leave 220, melee 36) x = 270 sits inside
    // the hysteresis band, x = 100 is in sight and x = 20 is in reach.
    const IN_BAND: Position = Position { x: 270.0, y: 0.0 };
    const IN_SIGHT: Position = Position { x: 100.0, y: 0.0 };
    const IN_REACH: Position = Position { x: 20.0, y: 0.0 };

    #[test]
    fn hysteresis_band_does_not_flicker() {
        let mut rig = Rig::new(IN_BAND);
        let d = iso_distance(Position::default(), IN_BAND);
        assert!(d > rig.stats.detection_radius && d <= rig.stats.leave_radius, "{d}");

        rig.run_until(EnemyState::Patrol, 100);
        for _ in 0..200 {
            assert_eq!(rig.tick(), None);
            assert_eq!(rig.enemy.state(), EnemyState::Patrol);
        }

        rig.retarget(IN_SIGHT);
        assert_eq!(rig.tick(), Some((EnemyState::Patrol, EnemyState::Chase)));
        rig.retarget(IN_BAND);
        for _ in 0..200 {
            assert_eq!(rig.tick(), None);
            assert_eq!(rig.enemy.state(), EnemyState::Chase);
        }
    }

    #[test]
    fn attack_falls_back_to_chase_then_patrol() {
        let mut rig = Rig::new(IN_SIGHT);
        rig.run_until(EnemyState::Chase, 200);

        rig.retarget(IN_REACH);
        assert_eq!(rig.tick(), Some((EnemyState::Chase, EnemyState::Attack)));
        let v = rig.physics.velocity(rig.enemy.body()).unwrap();
        assert!((v.speed() - rig.stats.attack_speed).abs() < 1e-3);

        rig.retarget(IN_BAND);
        assert_eq!(rig.tick(), Some((EnemyState::Attack, EnemyState::Chase)));

        rig.retarget(Position::new(400.0, 0.0));
        assert_eq!(rig.tick(), Some((EnemyState::Chase, EnemyState::Patrol)));
    }

    #[test]
    fn stagger_then_death_exactly_once() {
        let mut rig = Rig::new(Position::new(100.0, 0.0));
        let stats = rig.stats.clone();

        assert_eq!(
            rig.enemy.receive_hit(1, &stats, &mut rig.physics),
            EnemyHit::Staggered {
                from: EnemyState::Idle,
                health: 1
            }
        );
        assert_eq!(rig.enemy.state(), EnemyState::Stagger);
        assert_eq!(
            rig.enemy.receive_hit(1, &stats, &mut rig.physics),
            EnemyHit::Killed {
                from: EnemyState::Stagger
            }
        );
        assert_eq!(
            rig.enemy.receive_hit(1, &stats, &mut rig.physics),
            EnemyHit::Dropped
        );
        assert_eq!(rig.tick(), None);
    }

    #[test]
    fn stagger_returns_to_chase_when_player_is_close() {
        let mut rig = Rig::new(Position::new(100.0, 0.0));
        let stats = rig.stats.clone();
        rig.enemy.health = 10;
        rig.enemy.receive_hit(1, &stats, &mut rig.physics);
        for _ in 0..stats.stagger_ticks - 1 {
            assert_eq!(rig.tick(), None);
            assert_eq!(rig.physics.velocity(rig.enemy.body()), Some(Velocity::ZERO));
        }
        assert_eq!(rig.tick(), Some((EnemyState::Stagger, EnemyState::Chase)));
    }

    #[test]
    fn dead_is_terminal() {
        for to in [
            EnemyState::Idle,
            EnemyState::Patrol,
            EnemyState::Chase,
            EnemyState::Stagger,
        ] {
            assert!(!EnemyState::Dead.can_become(to));
        }
        assert!(!EnemyState::Idle.can_become(EnemyState::Chase));
    }
}
