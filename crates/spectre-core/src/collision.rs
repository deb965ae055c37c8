//! Contact classification.
//!
//! Every body the session spawns carries a [`BodyLabel`]. A contact between
//! two labelled bodies is looked up in [`DISPATCH_TABLE`] by the unordered
//! pair of label kinds; the result says which handler runs and which side
//! plays which role. `(A, B)` and `(B, A)` always classify identically, so the
//! order rapier reports a pair in never matters.

use serde::{Deserialize, Serialize};
use spectre_physics::BodyId;

use crate::enemy::EnemyId;
use crate::puzzle::{DoorRole, LeverId};

/// What a body is, as far as gameplay is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "label", rename_all = "snake_case")]
pub enum BodyLabel {
    Player,
    Enemy { id: EnemyId },
    Boss,
    /// Trigger area that wakes the boss.
    BossArena,
    Lever { id: LeverId },
    SafeZone,
    /// Static damaging area.
    Hazard { damage: u32 },
    Door { role: DoorRole },
    /// The player's melee swing.
    PlayerAttack,
    /// Something the boss threw.
    BossHazard,
    Wall,
    Crate,
    /// Inert scenery, such as a defeated boss.
    Decoration,
}

/// Payload-free discriminant of a [`BodyLabel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Player,
    Enemy,
    Boss,
    BossArena,
    Lever,
    SafeZone,
    Hazard,
    Door,
    PlayerAttack,
    BossHazard,
    Wall,
    Crate,
    Decoration,
}

impl BodyLabel {
    pub fn kind(&self) -> LabelKind {
        match self {
            BodyLabel::Player => LabelKind::Player,
            BodyLabel::Enemy { .. } => LabelKind::Enemy,
            BodyLabel::Boss => LabelKind::Boss,
            BodyLabel::BossArena => LabelKind::BossArena,
            BodyLabel::Lever { .. } => LabelKind::Lever,
            BodyLabel::SafeZone => LabelKind::SafeZone,
            BodyLabel::Hazard { .. } => LabelKind::Hazard,
            BodyLabel::Door { .. } => LabelKind::Door,
            BodyLabel::PlayerAttack => LabelKind::PlayerAttack,
            BodyLabel::BossHazard => LabelKind::BossHazard,
            BodyLabel::Wall => LabelKind::Wall,
            BodyLabel::Crate => LabelKind::Crate,
            BodyLabel::Decoration => LabelKind::Decoration,
        }
    }
}

/// Handler selected for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairRule {
    /// Enemy, hazard, boss or boss hazard touching the player.
    PlayerHurt,
    /// Lever overlap toggles `can_press`.
    PlayerLever,
    /// Safe zone overlap toggles `is_safe`.
    PlayerSafeZone,
    /// Door contact; only an open exit does anything.
    PlayerDoor,
    /// Walking into the boss arena.
    PlayerArena,
    /// Player swing on a phantom.
    EnemyHit,
    /// Player swing on the boss.
    BossHit,
}

/// Ordered `(first, second, rule)` rows. A contact matches a row in either
/// orientation.
pub const DISPATCH_TABLE: &[(LabelKind, LabelKind, PairRule)] = &[
    (LabelKind::Player, LabelKind::Enemy, PairRule::PlayerHurt),
    (LabelKind::Player, LabelKind::Hazard, PairRule::PlayerHurt),
    (LabelKind::Player, LabelKind::Boss, PairRule::PlayerHurt),
    (LabelKind::Player, LabelKind::BossHazard, PairRule::PlayerHurt),
    (LabelKind::Player, LabelKind::Lever, PairRule::PlayerLever),
    (LabelKind::Player, LabelKind::SafeZone, PairRule::PlayerSafeZone),
    (LabelKind::Player, LabelKind::Door, PairRule::PlayerDoor),
    (LabelKind::Player, LabelKind::BossArena, PairRule::PlayerArena),
    (LabelKind::PlayerAttack, LabelKind::Enemy, PairRule::EnemyHit),
    (LabelKind::PlayerAttack, LabelKind::Boss, PairRule::BossHit),
];

/// A body together with its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Side {
    pub body: BodyId,
    pub label: BodyLabel,
}

/// A contact resolved against the dispatch table, oriented so `first`
/// matches the row's first kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub rule: PairRule,
    pub first: Side,
    pub second: Side,
}

/// Look up the handler for a pair. `None` means the pair has no gameplay
/// meaning (wall against crate, enemy against enemy, ...).
pub fn classify(a: Side, b: Side) -> Option<Classified> {
    let (ka, kb) = (a.label.kind(), b.label.kind());
    DISPATCH_TABLE.iter().find_map(|&(first, second, rule)| {
        if (ka, kb) == (first, second) {
            Some(Classified {
                rule,
                first: a,
                second: b,
            })
        } else if (kb, ka) == (first, second) {
            Some(Classified {
                rule,
                first: b,
                second: a,
            })
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(index: u32, label: BodyLabel) -> Side {
        Side {
            body: BodyId::new(index, 0),
            label,
        }
    }

    #[test]
    fn classification_is_symmetric() {
        let player = side(0, BodyLabel::Player);
        let enemy = side(1, BodyLabel::Enemy { id: EnemyId(3) });

        let ab = classify(player, enemy).unwrap();
        let ba = classify(enemy, player).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.rule, PairRule::PlayerHurt);
        assert_eq!(ab.first, player);
    }

    #[test]
    fn irrelevant_pairs_are_unclassified() {
        let wall = side(0, BodyLabel::Wall);
        let crate_ = side(1, BodyLabel::Crate);
        assert_eq!(classify(wall, crate_), None);
        assert_eq!(
            classify(side(2, BodyLabel::Enemy { id: EnemyId(0) }), side(3, BodyLabel::Enemy { id: EnemyId(1) })),
            None
        );
        assert_eq!(classify(side(4, BodyLabel::Player), side(5, BodyLabel::Decoration)), None);
    }

    #[test]
    fn attack_rows_pick_the_target() {
        let swing = side(0, BodyLabel::PlayerAttack);
        let boss = side(1, BodyLabel::Boss);
        let hit = classify(boss, swing).unwrap();
        assert_eq!(hit.rule, PairRule::BossHit);
        assert_eq!(hit.second, boss);
    }

    #[test]
    fn table_has_no_ambiguous_rows() {
        for (i, &(a, b, _)) in DISPATCH_TABLE.iter().enumerate() {
            for &(c, d, _) in &DISPATCH_TABLE[i + 1..] {
                assert!((a, b) != (c, d) && (a, b) != (d, c), "{a:?}/{b:?} listed twice");
            }
        }
    }
}
