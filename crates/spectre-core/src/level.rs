//! Level descriptors handed over by the external level loader.
//!
//! A descriptor lists where things are and which named collider shape each
//! one uses. Positions are screen coordinates unless the descriptor is marked
//! `cartesian`, in which case they are projected on load (Tiled exports
//! ground coordinates).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spectre_physics::{ColliderShape, Position};

use crate::config::EnemyKind;
use crate::iso::cart_to_iso;
use crate::GameError;

/// Something placed in the level with a named shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placed {
    pub position: [f64; 2],
    pub shape: String,
}

/// An enemy spawn point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub position: [f64; 2],
}

/// A static damaging area (spikes, pits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardDesc {
    pub position: [f64; 2],
    pub shape: String,
    #[serde(default = "one")]
    pub damage: u32,
}

fn one() -> u32 {
    1
}

/// A door with distinct closed (solid) and open (sensor) shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorDesc {
    pub position: [f64; 2],
    #[serde(default = "closed_key")]
    pub closed_shape: String,
    #[serde(default = "open_key")]
    pub open_shape: String,
}

fn closed_key() -> String {
    "closed".to_owned()
}

fn open_key() -> String {
    "open".to_owned()
}

/// The boss and the trigger area that wakes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossDesc {
    pub position: [f64; 2],
    #[serde(default = "boss_key")]
    pub shape: String,
    pub arena: Placed,
}

fn boss_key() -> String {
    "boss".to_owned()
}

fn player_key() -> String {
    "player".to_owned()
}

fn phantom_key() -> String {
    "phantom".to_owned()
}

/// Everything the gameplay core needs to know about a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDescriptor {
    /// Positions are ground coordinates and must be projected.
    pub cartesian: bool,
    pub spawn_point: Option<[f64; 2]>,
    /// Named collider shapes referenced by everything below.
    pub shapes: BTreeMap<String, ColliderShape>,
    #[serde(default = "player_key")]
    pub player_shape: String,
    #[serde(default = "phantom_key")]
    pub enemy_shape: String,
    pub walls: Vec<Placed>,
    /// Pushable boxes.
    pub crates: Vec<Placed>,
    pub enemies: Vec<EnemySpawn>,
    /// Levers in authoring order (the HUD shows them in this order).
    pub levers: Vec<Placed>,
    pub safe_zones: Vec<Placed>,
    pub hazards: Vec<HazardDesc>,
    /// The exit; reaching it while open loads the next level.
    pub exit: Option<DoorDesc>,
    /// The way in. Decorative unless the level has a boss.
    pub entrance: Option<DoorDesc>,
    pub boss: Option<BossDesc>,
}

impl Default for LevelDescriptor {
    fn default() -> Self {
        Self {
            cartesian: false,
            spawn_point: None,
            shapes: BTreeMap::new(),
            player_shape: player_key(),
            enemy_shape: phantom_key(),
            walls: Vec::new(),
            crates: Vec::new(),
            enemies: Vec::new(),
            levers: Vec::new(),
            safe_zones: Vec::new(),
            hazards: Vec::new(),
            exit: None,
            entrance: None,
            boss: None,
        }
    }
}

impl LevelDescriptor {
    /// Parse a JSON level description.
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a named shape.
    pub fn shape(&self, key: &str) -> Result<&ColliderShape, GameError> {
        self.shapes.get(key).ok_or_else(|| GameError::UnknownShape {
            key: key.to_owned(),
        })
    }

    /// Screen position of an authored coordinate.
    pub fn place(&self, [x, y]: [f64; 2]) -> Position {
        if self.cartesian {
            let (sx, sy) = cart_to_iso(x, y);
            Position::new(sx, sy)
        } else {
            Position::new(x, y)
        }
    }

    /// Whether this is a boss level.
    pub fn has_boss(&self) -> bool {
        self.boss.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r#"{
        "cartesian": true,
        "spawn_point": [64, 0],
        "shapes": {
            "player": { "type": "circle", "radius": 8 },
            "lever": { "type": "box", "half_width": 10, "half_height": 6 }
        },
        "enemies": [ { "kind": "red", "position": [100, 100] } ],
        "levers": [ { "position": [0, 64], "shape": "lever" } ],
        "exit": { "position": [200, 0] }
    }"#;

    #[test]
    fn parses_with_defaults() {
        let level = LevelDescriptor::from_json_str(LEVEL).unwrap();
        assert_eq!(level.player_shape, "player");
        assert_eq!(level.enemy_shape, "phantom");
        assert_eq!(level.enemies[0].kind, EnemyKind::Red);
        let exit = level.exit.as_ref().unwrap();
        assert_eq!(exit.closed_shape, "closed");
        assert_eq!(exit.open_shape, "open");
        assert!(!level.has_boss());
        assert!(level.walls.is_empty());
    }

    #[test]
    fn cartesian_positions_are_projected() {
        let level = LevelDescriptor::from_json_str(LEVEL).unwrap();
        assert_eq!(level.place([64.0, 0.0]), Position::new(64.0, 32.0));
    }

    #[test]
    fn unknown_shape_is_reported_by_name() {
        let level = LevelDescriptor::from_json_str(LEVEL).unwrap();
        let err = level.shape("closed").unwrap_err();
        assert!(matches!(err, GameError::UnknownShape { ref key } if key == "closed"));
    }
}
