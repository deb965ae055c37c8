//! Gameplay tuning.
//!
//! Every value has a default so a config file only needs the fields it
//! overrides. Timings are expressed in frames at [`GameConfig::fixed_dt`];
//! speeds and distances in screen pixels (per second for speeds).

use serde::{Deserialize, Deserializer, Serialize};

use crate::GameError;

// ---------------------------------------------------------------------------
// Enemy kinds
// ---------------------------------------------------------------------------

/// Phantom colour variants. They share one state machine and differ only in
/// their [`EnemyStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Slow wanderer.
    Purple,
    /// Sturdy, short sighted.
    Green,
    /// Fast and far sighted.
    Red,
}

impl EnemyKind {
    /// Prefix used for animation keys.
    pub fn as_str(self) -> &'static str {
        match self {
            EnemyKind::Purple => "purple",
            EnemyKind::Green => "green",
            EnemyKind::Red => "red",
        }
    }
}

/// Per-kind enemy constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Hit points on spawn.
    pub health: u32,
    /// Wander speed.
    pub patrol_speed: f64,
    /// Pursuit speed.
    pub chase_speed: f64,
    /// Lunge speed while attacking.
    pub attack_speed: f64,
    /// Ground distance at which a patrolling enemy notices the player.
    pub detection_radius: f64,
    /// Ground distance at which a chasing enemy gives up. Must be at least
    /// `detection_radius` so the enemy does not flicker at the boundary.
    pub leave_radius: f64,
    /// Ground distance at which a chase turns into an attack.
    pub melee_range: f64,
    /// Frames spent idle after spawning.
    pub idle_ticks: u32,
    /// Frames spent staggered after a hit.
    pub stagger_ticks: u32,
    /// Frames between patrol heading changes.
    pub patrol_turn_ticks: u32,
    /// Lives taken from the player on contact.
    pub contact_damage: u32,
}

impl EnemyStats {
    fn purple() -> Self {
        Self {
            health: 2,
            patrol_speed: 40.0,
            chase_speed: 70.0,
            attack_speed: 110.0,
            detection_radius: 160.0,
            leave_radius: 220.0,
            melee_range: 36.0,
            idle_ticks: 60,
            stagger_ticks: 30,
            patrol_turn_ticks: 120,
            contact_damage: 1,
        }
    }

    fn green() -> Self {
        Self {
            health: 3,
            patrol_speed: 30.0,
            chase_speed: 60.0,
            attack_speed: 90.0,
            detection_radius: 140.0,
            leave_radius: 200.0,
            ..Self::purple()
        }
    }

    fn red() -> Self {
        Self {
            health: 4,
            patrol_speed: 50.0,
            chase_speed: 90.0,
            attack_speed: 140.0,
            detection_radius: 200.0,
            leave_radius: 260.0,
            melee_range: 40.0,
            patrol_turn_ticks: 90,
            ..Self::purple()
        }
    }
}

/// Overrides read from a config file. Missing fields keep the kind's
/// built-in value.
#[derive(Debug, Default, Deserialize)]
struct StatsOverride {
    health: Option<u32>,
    patrol_speed: Option<f64>,
    chase_speed: Option<f64>,
    attack_speed: Option<f64>,
    detection_radius: Option<f64>,
    leave_radius: Option<f64>,
    melee_range: Option<f64>,
    idle_ticks: Option<u32>,
    stagger_ticks: Option<u32>,
    patrol_turn_ticks: Option<u32>,
    contact_damage: Option<u32>,
}

impl StatsOverride {
    fn apply(self, base: EnemyStats) -> EnemyStats {
        EnemyStats {
            health: self.health.unwrap_or(base.health),
            patrol_speed: self.patrol_speed.unwrap_or(base.patrol_speed),
            chase_speed: self.chase_speed.unwrap_or(base.chase_speed),
            attack_speed: self.attack_speed.unwrap_or(base.attack_speed),
            detection_radius: self.detection_radius.unwrap_or(base.detection_radius),
            leave_radius: self.leave_radius.unwrap_or(base.leave_radius),
            melee_range: self.melee_range.unwrap_or(base.melee_range),
            idle_ticks: self.idle_ticks.unwrap_or(base.idle_ticks),
            stagger_ticks: self.stagger_ticks.unwrap_or(base.stagger_ticks),
            patrol_turn_ticks: self.patrol_turn_ticks.unwrap_or(base.patrol_turn_ticks),
            contact_damage: self.contact_damage.unwrap_or(base.contact_damage),
        }
    }
}

fn purple_stats<'de, D: Deserializer<'de>>(d: D) -> Result<EnemyStats, D::Error> {
    Ok(StatsOverride::deserialize(d)?.apply(EnemyStats::purple()))
}

fn green_stats<'de, D: Deserializer<'de>>(d: D) -> Result<EnemyStats, D::Error> {
    Ok(StatsOverride::deserialize(d)?.apply(EnemyStats::green()))
}

fn red_stats<'de, D: Deserializer<'de>>(d: D) -> Result<EnemyStats, D::Error> {
    Ok(StatsOverride::deserialize(d)?.apply(EnemyStats::red()))
}

/// Stats for every enemy kind. Each kind can be overridden field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyRoster {
    #[serde(deserialize_with = "purple_stats")]
    pub purple: EnemyStats,
    #[serde(deserialize_with = "green_stats")]
    pub green: EnemyStats,
    #[serde(deserialize_with = "red_stats")]
    pub red: EnemyStats,
}

impl EnemyRoster {
    /// Stats for `kind`.
    pub fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Purple => &self.purple,
            EnemyKind::Green => &self.green,
            EnemyKind::Red => &self.red,
        }
    }
}

impl Default for EnemyRoster {
    fn default() -> Self {
        Self {
            purple: EnemyStats::purple(),
            green: EnemyStats::green(),
            red: EnemyStats::red(),
        }
    }
}

// ---------------------------------------------------------------------------
// Player attack and boss
// ---------------------------------------------------------------------------

/// The player's melee swing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Damage dealt to phantoms.
    pub damage: u32,
    /// Damage dealt to the boss.
    pub boss_damage: u32,
    /// Distance from the player to the hit-box centre.
    pub reach: f64,
    /// Hit-box radius.
    pub radius: f64,
    /// Frames the hit-box stays alive.
    pub lifetime_ticks: u32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            damage: 1,
            boss_damage: 10,
            reach: 28.0,
            radius: 14.0,
            lifetime_ticks: 12,
        }
    }
}

/// Boss tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Hit points on spawn.
    pub health: u32,
    /// The boss enters phase 2 once health drops below this fraction of
    /// its maximum.
    pub phase2_fraction: f64,
    /// Pursuit speed while engaged.
    pub engaged_speed: f64,
    /// Pursuit speed in phase 2.
    pub phase2_speed: f64,
    /// Frames between hazard attacks while engaged.
    pub engaged_cooldown_ticks: u32,
    /// Frames between hazard attacks in phase 2.
    pub phase2_cooldown_ticks: u32,
    /// Lives taken by one hazard hit or by touching the boss.
    pub hazard_damage: u32,
    /// Hazard hit-box radius.
    pub hazard_radius: f64,
    /// Distance from the boss to the hazard centre.
    pub hazard_reach: f64,
    /// Frames a hazard stays alive.
    pub hazard_lifetime_ticks: u32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            health: 100,
            phase2_fraction: 0.5,
            engaged_speed: 50.0,
            phase2_speed: 85.0,
            engaged_cooldown_ticks: 120,
            phase2_cooldown_ticks: 70,
            hazard_damage: 1,
            hazard_radius: 18.0,
            hazard_reach: 40.0,
            hazard_lifetime_ticks: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Top-level gameplay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seconds per frame. Must be positive and finite.
    pub fixed_dt: f64,
    /// Lives on a fresh start.
    pub max_lives: u32,
    /// Player speed, identical in all eight directions.
    pub walk_speed: f64,
    /// Horizontal skew applied to diagonal headings so they follow the
    /// isometric grid lines. `1.0` gives the classic 2:1 slope.
    pub orientation_offset: f64,
    /// Frames of fade-in on level entry. The player is frozen meanwhile.
    pub fade_in_ticks: u32,
    /// Frames of fade-out before a scene transition.
    pub fade_out_ticks: u32,
    /// Index of the final (boss) level; clearing it leads to the outro.
    pub last_level: i32,
    /// Seed mixed with the level index for patrol randomness.
    pub rng_seed: u64,
    pub player_attack: AttackConfig,
    pub enemies: EnemyRoster,
    pub boss: BossConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_lives: 3,
            walk_speed: 120.0,
            orientation_offset: 1.0,
            fade_in_ticks: 120,
            fade_out_ticks: 120,
            last_level: 8,
            rng_seed: 0x5eed,
            player_attack: AttackConfig::default(),
            enemies: EnemyRoster::default(),
            boss: BossConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), GameError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(GameError::InvalidConfig(format!(
                "fixed_dt must be positive and finite, got {}",
                self.fixed_dt
            )));
        }
        if self.max_lives == 0 {
            return Err(GameError::InvalidConfig("max_lives must be at least 1".into()));
        }
        if !(self.walk_speed >= 0.0 && self.walk_speed.is_finite()) {
            return Err(GameError::InvalidConfig(format!(
                "walk_speed must be non-negative, got {}",
                self.walk_speed
            )));
        }
        if !(self.orientation_offset >= 0.0 && self.orientation_offset.is_finite()) {
            return Err(GameError::InvalidConfig(format!(
                "orientation_offset must be non-negative and finite, got {}",
                self.orientation_offset
            )));
        }
        for kind in [EnemyKind::Purple, EnemyKind::Green, EnemyKind::Red] {
            let stats = self.enemies.stats(kind);
            if stats.leave_radius < stats.detection_radius {
                return Err(GameError::InvalidConfig(format!(
                    "{} enemies: leave_radius {} is smaller than detection_radius {}",
                    kind.as_str(),
                    stats.leave_radius,
                    stats.detection_radius
                )));
            }
            if stats.health == 0 {
                return Err(GameError::InvalidConfig(format!(
                    "{} enemies spawn dead",
                    kind.as_str()
                )));
            }
        }
        let fraction = self.boss.phase2_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(GameError::InvalidConfig(format!(
                "boss.phase2_fraction must be in (0, 1), got {fraction}"
            )));
        }
        if self.boss.health == 0 {
            return Err(GameError::InvalidConfig("boss.health must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json_str(r#"{ "max_lives": 5, "boss": { "health": 40 } }"#)
            .unwrap();
        assert_eq!(config.max_lives, 5);
        assert_eq!(config.boss.health, 40);
        assert_eq!(config.boss.phase2_fraction, 0.5);
        assert_eq!(config.walk_speed, GameConfig::default().walk_speed);
    }

    #[test]
    fn partial_enemy_stats_keep_their_kind_defaults() {
        let config = GameConfig::from_json_str(r#"{ "enemies": { "red": { "health": 5 } } }"#)
            .unwrap();
        let defaults = EnemyRoster::default();
        assert_eq!(config.enemies.red.health, 5);
        assert_eq!(
            EnemyStats {
                health: defaults.red.health,
                ..config.enemies.red.clone()
            },
            defaults.red
        );
        assert_eq!(config.enemies.purple, defaults.purple);
        assert_eq!(config.enemies.green, defaults.green);
    }

    #[test]
    fn orientation_offset_must_be_non_negative_and_finite() {
        for bad in [-3.0, f64::NAN, f64::INFINITY] {
            let config = GameConfig {
                orientation_offset: bad,
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("orientation_offset"), "{err}");
        }
        let flat = GameConfig {
            orientation_offset: 0.0,
            ..Default::default()
        };
        flat.validate().unwrap();
    }

    #[test]
    fn leave_radius_below_detection_is_rejected() {
        let mut config = GameConfig::default();
        config.enemies.red.leave_radius = 10.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("red enemies"), "{err}");
    }

    #[test]
    fn zero_dt_is_rejected() {
        let err = GameConfig::from_json_str(r#"{ "fixed_dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, GameError::Json(_)));
    }

    #[test]
    fn roster_lookup_by_kind() {
        let roster = EnemyRoster::default();
        assert!(roster.stats(EnemyKind::Red).detection_radius > roster.stats(EnemyKind::Green).detection_radius);
    }
}
