//! The final guardian.
//!
//! `Dormant -> Engaged -> Phase2 -> Defeated`, strictly forward. The boss
//! wakes when the player walks into its arena, speeds up once its health
//! falls below a fraction of the maximum, and becomes scenery when it dies.
//! Door and audio side effects are applied by the session from the
//! transitions this module returns.

use serde::{Deserialize, Serialize};
use spectre_physics::{BodyId, PhysicsWorld, Position, Velocity};

use crate::config::BossConfig;
use crate::movement::velocity_towards;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossPhase {
    Dormant,
    Engaged,
    Phase2,
    Defeated,
}

impl BossPhase {
    /// The only phase reachable from `self`, if any.
    pub fn next(self) -> Option<BossPhase> {
        match self {
            BossPhase::Dormant => Some(BossPhase::Engaged),
            BossPhase::Engaged => Some(BossPhase::Phase2),
            BossPhase::Phase2 => Some(BossPhase::Defeated),
            BossPhase::Defeated => None,
        }
    }

    /// Whether the boss fights in this phase.
    pub fn is_fighting(self) -> bool {
        matches!(self, BossPhase::Engaged | BossPhase::Phase2)
    }
}

pub type PhaseChange = (BossPhase, BossPhase);

/// Result of a player hit on the boss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BossHit {
    pub health: u32,
    /// Phase changes caused by the hit, in order.
    pub changes: Vec<PhaseChange>,
}

/// A hazard the boss just threw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossAttack {
    /// Centre of the hazard hit-box.
    pub at: Position,
}

#[derive(Debug, Clone)]
pub struct Boss {
    body: BodyId,
    target: Option<BodyId>,
    health: u32,
    max_health: u32,
    phase: BossPhase,
    cooldown: u32,
}

impl Boss {
    pub fn new(body: BodyId, target: Option<BodyId>, config: &BossConfig) -> Self {
        Self {
            body,
            target,
            health: config.health,
            max_health: config.health,
            phase: BossPhase::Dormant,
            cooldown: config.engaged_cooldown_ticks,
        }
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    fn advance_to(&mut self, to: BossPhase) -> Option<PhaseChange> {
        let from = self.phase;
        if from.next() != Some(to) {
            return None;
        }
        tracing::info!(?from, ?to, health = self.health, "boss phase");
        self.phase = to;
        Some((from, to))
    }

    /// Wake up. Only a dormant boss can be engaged.
    pub fn engage(&mut self, config: &BossConfig) -> Option<PhaseChange> {
        if self.phase != BossPhase::Dormant {
            return None;
        }
        self.cooldown = config.engaged_cooldown_ticks.max(1);
        self.advance_to(BossPhase::Engaged)
    }

    fn below_threshold(&self, config: &BossConfig) -> bool {
        (self.health as f64) < self.max_health as f64 * config.phase2_fraction
    }

    /// Apply player damage. Returns `None` when the hit is dropped (dormant
    /// or already defeated).
    pub fn receive_hit(
        &mut self,
        damage: u32,
        config: &BossConfig,
        physics: &mut PhysicsWorld,
    ) -> Option<BossHit> {
        if !self.phase.is_fighting() {
            tracing::debug!(phase = ?self.phase, "boss hit dropped");
            return None;
        }
        self.health = self.health.saturating_sub(damage);

        let mut changes = Vec::new();
        if self.phase == BossPhase::Engaged && self.below_threshold(config) {
            changes.extend(self.advance_to(BossPhase::Phase2));
            self.cooldown = self.cooldown.min(config.phase2_cooldown_ticks.max(1));
        }
        if self.health == 0 {
            changes.extend(self.advance_to(BossPhase::Defeated));
            physics.set_velocity(self.body, Velocity::ZERO);
        }
        Some(BossHit {
            health: self.health,
            changes,
        })
    }

    /// One frame of pursuit. Returns an attack when the cooldown runs out.
    pub fn update(&mut self, physics: &mut PhysicsWorld, config: &BossConfig) -> Option<BossAttack> {
        if !self.phase.is_fighting() {
            physics.set_velocity(self.body, Velocity::ZERO);
            return None;
        }
        let Some(me) = physics.position(self.body) else {
            tracing::warn!(body = %self.body, "boss body missing; skipping update");
            return None;
        };
        let Some(target) = self.target.and_then(|t| physics.position(t)) else {
            physics.set_velocity(self.body, Velocity::ZERO);
            return None;
        };

        let (speed, cooldown) = match self.phase {
            BossPhase::Phase2 => (config.phase2_speed, config.phase2_cooldown_ticks),
            _ => (config.engaged_speed, config.engaged_cooldown_ticks),
        };
        let (dx, dy) = (target.x - me.x, target.y - me.y);
        physics.set_velocity(self.body, velocity_towards(dx, dy, speed));

        self.cooldown = self.cooldown.saturating_sub(1);
        if self.cooldown > 0 {
            return None;
        }
        self.cooldown = cooldown.max(1);
        let toward = velocity_towards(dx, dy, config.hazard_reach);
        Some(BossAttack {
            at: Position::new(me.x + toward.dx, me.y + toward.dy),
        })
    }
}
