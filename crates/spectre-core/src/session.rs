//! The level session context.
//!
//! A [`Session`] owns everything that lives for one level: the physics world,
//! the body labels, the player, the phantoms, levers, doors, the boss, live
//! hit-boxes, the scene manager and the seeded RNG. Each field has exactly
//! one writer (the operation named after it). Managers never reach into each
//! other's state; the session routes between them.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use spectre_physics::{
    BodyDesc, BodyId, BodyKind, ColliderShape, Contact, ContactPhase, PhysicsWorld, Position,
};

use crate::boss::{Boss, BossPhase};
use crate::collision::{classify, BodyLabel, LabelKind, PairRule, Side};
use crate::config::GameConfig;
use crate::enemy::{Enemy, EnemyHit, EnemyId, EnemyState};
use crate::events::{AudioCue, SessionEvent};
use crate::input::FrameInput;
use crate::iso::depth;
use crate::level::LevelDescriptor;
use crate::movement::heading;
use crate::player::{DamageOutcome, Player};
use crate::puzzle::{close_door, open_door, Door, DoorRole, LeverId, LeverTracker};
use crate::scene::{SceneManager, SceneStep, TransitionPayload};
use crate::GameError;

/// Linear damping of pushable crates so they stop after a shove.
const CRATE_DAMPING: f64 = 4.0;

// ---------------------------------------------------------------------------
// Entry, HUD and drawables
// ---------------------------------------------------------------------------

/// What the previous scene handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionEntry {
    pub level: i32,
    /// Life carried over; `None` (or zero) starts with full lives.
    pub remaining_life: Option<u32>,
}

impl SessionEntry {
    pub fn new(level: i32) -> Self {
        Self {
            level,
            remaining_life: None,
        }
    }

    pub fn with_life(mut self, life: u32) -> Self {
        self.remaining_life = Some(life);
        self
    }
}

impl From<TransitionPayload> for SessionEntry {
    fn from(payload: TransitionPayload) -> Self {
        Self {
            level: payload.level,
            remaining_life: Some(payload.remaining_life),
        }
    }
}

/// Boss bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossHud {
    pub health: u32,
    pub max_health: u32,
    pub phase: BossPhase,
}

/// Snapshot for the presentation layer's HUD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub level: i32,
    pub life: u32,
    pub max_lives: u32,
    /// Lever icons in authoring order.
    pub levers: Vec<bool>,
    pub exit_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boss: Option<BossHud>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawableKind {
    Player,
    Enemy,
    Boss,
    Crate,
}

/// One depth-sorted sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub body: BodyId,
    pub kind: DrawableKind,
    pub position: Position,
    pub depth: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
}

// ---------------------------------------------------------------------------
// Hit-boxes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitBoxOwner {
    Player,
    Boss,
}

#[derive(Debug, Clone, Copy)]
struct HitBox {
    body: BodyId,
    owner: HitBoxOwner,
    ttl: u32,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One level's worth of gameplay state.
pub struct Session {
    config: GameConfig,
    physics: PhysicsWorld,
    labels: HashMap<BodyId, BodyLabel>,
    player: Option<Player>,
    /// Indexed by [`EnemyId`]; dead phantoms leave an empty slot.
    enemies: Vec<Option<Enemy>>,
    crates: Vec<BodyId>,
    levers: LeverTracker,
    exit: Option<Door>,
    entrance: Option<Door>,
    boss: Option<Boss>,
    boss_shape: Option<ColliderShape>,
    hitboxes: Vec<HitBox>,
    scene: SceneManager,
    rng: Pcg32,
    outbox: Vec<SessionEvent>,
}

impl Session {
    /// Spawn every body the level describes and start the fade-in.
    ///
    /// Fails only on content errors: an unknown shape key, a degenerate
    /// polygon, or an invalid config.
    pub fn build(
        level: &LevelDescriptor,
        config: GameConfig,
        entry: SessionEntry,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let seed = config.rng_seed ^ entry.level as u64;
        let mut session = Session {
            scene: SceneManager::new(entry.level, &config),
            physics: PhysicsWorld::new_zero_gravity(),
            labels: HashMap::new(),
            player: None,
            enemies: Vec::with_capacity(level.enemies.len()),
            crates: Vec::with_capacity(level.crates.len()),
            levers: LeverTracker::new(),
            exit: None,
            entrance: None,
            boss: None,
            boss_shape: None,
            hitboxes: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            outbox: Vec::new(),
            config,
        };

        for wall in &level.walls {
            let desc = BodyDesc::solid(BodyKind::Static, level.shape(&wall.shape)?.clone());
            session.spawn_labelled(&desc, level.place(wall.position), BodyLabel::Wall)?;
        }
        for crate_ in &level.crates {
            let desc = BodyDesc::solid(BodyKind::Dynamic, level.shape(&crate_.shape)?.clone())
                .with_damping(CRATE_DAMPING);
            let body = session.spawn_labelled(&desc, level.place(crate_.position), BodyLabel::Crate)?;
            session.crates.push(body);
        }

        let life = SceneManager::entry_life(entry.remaining_life, session.config.max_lives);
        match level.spawn_point {
            Some(at) => {
                let desc = BodyDesc::solid(BodyKind::Dynamic, level.shape(&level.player_shape)?.clone());
                let body = session.spawn_labelled(&desc, level.place(at), BodyLabel::Player)?;
                session.player = Some(Player::new(body, life));
            }
            None => tracing::warn!(level = entry.level, "level has no spawn point; running without a player"),
        }
        let target = session.player.as_ref().map(Player::body);

        for spawn in &level.levers {
            let desc = BodyDesc::sensor(BodyKind::Static, level.shape(&spawn.shape)?.clone());
            let body = session.physics.spawn(&desc, level.place(spawn.position))?;
            let id = session.levers.add(body);
            session.labels.insert(body, BodyLabel::Lever { id });
        }
        for zone in &level.safe_zones {
            let desc = BodyDesc::sensor(BodyKind::Static, level.shape(&zone.shape)?.clone());
            session.spawn_labelled(&desc, level.place(zone.position), BodyLabel::SafeZone)?;
        }
        for hazard in &level.hazards {
            let desc = BodyDesc::sensor(BodyKind::Static, level.shape(&hazard.shape)?.clone());
            session.spawn_labelled(
                &desc,
                level.place(hazard.position),
                BodyLabel::Hazard {
                    damage: hazard.damage,
                },
            )?;
        }

        if let Some(desc) = &level.exit {
            let door = Door::spawn(
                &mut session.physics,
                DoorRole::Exit,
                level.place(desc.position),
                level.shape(&desc.closed_shape)?.clone(),
                level.shape(&desc.open_shape)?.clone(),
                false,
            )?;
            session.labels.insert(door.body(), BodyLabel::Door { role: DoorRole::Exit });
            session.exit = Some(door);
        }
        if let Some(desc) = &level.entrance {
            // The entrance only matters on boss levels, where it stays open
            // until the fight starts.
            let door = Door::spawn(
                &mut session.physics,
                DoorRole::Entrance,
                level.place(desc.position),
                level.shape(&desc.closed_shape)?.clone(),
                level.shape(&desc.open_shape)?.clone(),
                level.has_boss(),
            )?;
            session.labels.insert(door.body(), BodyLabel::Door { role: DoorRole::Entrance });
            session.entrance = Some(door);
        }

        for (slot, spawn) in level.enemies.iter().enumerate() {
            let id = EnemyId(slot as u32);
            let desc = BodyDesc::solid(BodyKind::Dynamic, level.shape(&level.enemy_shape)?.clone());
            let body = session.spawn_labelled(&desc, level.place(spawn.position), BodyLabel::Enemy { id })?;
            let stats = session.config.enemies.stats(spawn.kind);
            session
                .enemies
                .push(Some(Enemy::new(id, spawn.kind, body, target, stats)));
        }

        if let Some(desc) = &level.boss {
            let shape = level.shape(&desc.shape)?.clone();
            let body = session.spawn_labelled(
                &BodyDesc::solid(BodyKind::Kinematic, shape.clone()),
                level.place(desc.position),
                BodyLabel::Boss,
            )?;
            let arena = BodyDesc::sensor(BodyKind::Static, level.shape(&desc.arena.shape)?.clone());
            session.spawn_labelled(&arena, level.place(desc.arena.position), BodyLabel::BossArena)?;
            session.boss = Some(Boss::new(body, target, &session.config.boss));
            session.boss_shape = Some(shape);
        }

        let exit_body = session.exit.as_ref().map(Door::body);
        if let Some(player) = session.player.as_mut() {
            player.set_exit_door(exit_body);
        }

        tracing::info!(
            level = entry.level,
            life,
            enemies = session.enemies.len(),
            levers = session.levers.len(),
            boss = session.boss.is_some(),
            "level session built"
        );
        session.outbox.push(SessionEvent::LevelEntered {
            level: entry.level,
            lives: life,
        });
        session.outbox.push(SessionEvent::Audio {
            cue: AudioCue::AmbientLoop,
        });
        let fade_in = session.config.fade_in_ticks;
        session.scene.start_fade_in(fade_in, &mut session.outbox);
        session.check_if_all_pressed();
        Ok(session)
    }

    fn spawn_labelled(
        &mut self,
        desc: &BodyDesc,
        at: Position,
        label: BodyLabel,
    ) -> Result<BodyId, GameError> {
        let body = self.physics.spawn(desc, at)?;
        self.labels.insert(body, label);
        Ok(body)
    }

    fn despawn_labelled(&mut self, body: BodyId) {
        self.physics.despawn(body);
        self.labels.remove(&body);
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn level(&self) -> i32 {
        self.scene.level()
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Phantoms still alive, in slot order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().flatten()
    }

    pub fn levers(&self) -> &LeverTracker {
        &self.levers
    }

    pub fn exit(&self) -> Option<&Door> {
        self.exit.as_ref()
    }

    pub fn entrance(&self) -> Option<&Door> {
        self.entrance.as_ref()
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    /// Gameplay label of a body, if it has one.
    pub fn label(&self, body: BodyId) -> Option<BodyLabel> {
        self.labels.get(&body).copied()
    }

    /// Bodies currently carrying a label of `kind`, in handle order.
    pub fn bodies_labelled(&self, kind: LabelKind) -> Vec<BodyId> {
        let mut bodies: Vec<BodyId> = self
            .labels
            .iter()
            .filter(|(_, label)| label.kind() == kind)
            .map(|(&body, _)| body)
            .collect();
        bodies.sort();
        bodies
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    // -- outputs ------------------------------------------------------------

    pub fn hud(&self) -> Hud {
        Hud {
            level: self.scene.level(),
            life: self.player.as_ref().map_or(0, Player::life),
            max_lives: self.config.max_lives,
            levers: self.levers.pressed_flags(),
            exit_open: self.exit.as_ref().is_some_and(Door::is_open),
            boss: self.boss.as_ref().map(|b| BossHud {
                health: b.health(),
                max_health: b.max_health(),
                phase: b.phase(),
            }),
        }
    }

    /// Player, phantoms, boss and crates, back to front.
    pub fn render_order(&self) -> Vec<Drawable> {
        let mut drawables = Vec::new();
        let mut push = |body: BodyId, kind: DrawableKind, animation: Option<String>| {
            if let Some(position) = self.physics.position(body) {
                drawables.push(Drawable {
                    body,
                    kind,
                    position,
                    depth: depth(position.y),
                    animation,
                });
            }
        };

        if let Some(player) = &self.player {
            push(player.body(), DrawableKind::Player, player.animation_key());
        }
        for enemy in self.enemies.iter().flatten() {
            push(enemy.body(), DrawableKind::Enemy, Some(enemy.animation_key()));
        }
        if let Some(boss) = &self.boss {
            push(boss.body(), DrawableKind::Boss, None);
        }
        for &body in &self.crates {
            push(body, DrawableKind::Crate, None);
        }

        drawables.sort_by(|a, b| a.depth.total_cmp(&b.depth).then(a.body.cmp(&b.body)));
        drawables
    }

    // -- puzzle -------------------------------------------------------------

    /// Open the exit the first time every lever is pressed. Boss levels gate
    /// on the boss instead, and a level without an exit has nothing to open.
    pub fn check_if_all_pressed(&mut self) -> bool {
        if self.boss.is_some() || !self.levers.all_pressed() {
            return false;
        }
        match self.exit.as_mut() {
            Some(exit) => open_door(exit, &mut self.physics, &mut self.outbox),
            None => false,
        }
    }

    // -- frame phases -------------------------------------------------------

    /// Advance physics by one fixed step and return the contacts it raised.
    pub(crate) fn step_physics(&mut self) -> Vec<Contact> {
        self.physics.step(self.config.fixed_dt)
    }

    /// Route one contact through the dispatch table.
    pub fn dispatch_contact(&mut self, contact: Contact) {
        let (Some(&la), Some(&lb)) = (self.labels.get(&contact.a), self.labels.get(&contact.b)) else {
            tracing::trace!(a = %contact.a, b = %contact.b, "contact with unlabelled body ignored");
            return;
        };
        let Some(pair) = classify(
            Side {
                body: contact.a,
                label: la,
            },
            Side {
                body: contact.b,
                label: lb,
            },
        ) else {
            tracing::trace!(a = ?la.kind(), b = ?lb.kind(), "unclassified contact ignored");
            return;
        };

        let started = contact.phase == ContactPhase::Started;
        match (pair.rule, pair.second.label) {
            (PairRule::PlayerHurt, label) if started => {
                if let Some(amount) = self.contact_damage(label) {
                    self.hurt_player(amount);
                }
            }
            (PairRule::PlayerLever, BodyLabel::Lever { id }) => {
                if let Some(player) = self.player.as_mut() {
                    if started {
                        player.enter_lever(id);
                    } else {
                        player.leave_lever(id);
                    }
                }
            }
            (PairRule::PlayerSafeZone, _) => {
                if let Some(player) = self.player.as_mut() {
                    if started {
                        player.enter_safe_zone();
                    } else {
                        player.leave_safe_zone();
                    }
                }
            }
            (PairRule::PlayerDoor, BodyLabel::Door { role: DoorRole::Exit }) if started => {
                self.reach_exit(pair.second.body);
            }
            (PairRule::PlayerArena, _) if started => self.engage_boss(),
            (PairRule::EnemyHit, BodyLabel::Enemy { id }) if started => self.hit_enemy(id),
            (PairRule::BossHit, _) if started => self.hit_boss(),
            _ => {}
        }
    }

    /// Movement, lever use and the attack swing.
    pub(crate) fn update_player(&mut self, input: Option<&FrameInput>) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if input.is_none() {
            tracing::warn!("no input device this frame; holding the player still");
        }
        player.check_player_inputs(input, &mut self.physics, &self.config);

        let Some(input) = input.filter(|i| i.action_pressed && player.can_move()) else {
            return;
        };
        if player.can_press() {
            if let Some(lever) = player.use_button(input, &mut self.levers) {
                self.lever_pressed(lever);
            }
        } else {
            self.swing();
        }
    }

    pub(crate) fn update_enemies(&mut self) {
        let offset = self.config.orientation_offset;
        for enemy in self.enemies.iter_mut().flatten() {
            let stats = self.config.enemies.stats(enemy.kind());
            if let Some((from, to)) = enemy.update(&mut self.physics, stats, offset, &mut self.rng) {
                self.outbox.push(SessionEvent::EnemyStateChanged {
                    enemy: enemy.id(),
                    from,
                    to,
                });
            }
        }
    }

    pub(crate) fn update_boss(&mut self) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let Some(attack) = boss.update(&mut self.physics, &self.config.boss) else {
            return;
        };
        let desc = BodyDesc::sensor(
            BodyKind::Kinematic,
            ColliderShape::Circle {
                radius: self.config.boss.hazard_radius,
            },
        );
        match self.spawn_labelled(&desc, attack.at, BodyLabel::BossHazard) {
            Ok(body) => self.hitboxes.push(HitBox {
                body,
                owner: HitBoxOwner::Boss,
                ttl: self.config.boss.hazard_lifetime_ticks.max(1),
            }),
            Err(e) => tracing::warn!(error = %e, "boss hazard could not be spawned"),
        }
    }

    /// Count hit-box lifetimes down and remove the expired ones.
    pub(crate) fn expire_hitboxes(&mut self) {
        let physics = &mut self.physics;
        let labels = &mut self.labels;
        self.hitboxes.retain_mut(|hitbox| {
            hitbox.ttl = hitbox.ttl.saturating_sub(1);
            if hitbox.ttl > 0 {
                return true;
            }
            physics.despawn(hitbox.body);
            labels.remove(&hitbox.body);
            false
        });
    }

    /// Advance fades. Returns the payload on the frame it is released.
    pub(crate) fn advance_scene(&mut self) -> Option<TransitionPayload> {
        match self.scene.advance(&mut self.outbox) {
            SceneStep::Idle => None,
            SceneStep::FadeInDone => {
                if let Some(player) = self.player.as_mut() {
                    player.finish_fade_in();
                }
                None
            }
            SceneStep::Transition(payload) => Some(payload),
        }
    }

    // -- handlers -----------------------------------------------------------

    fn contact_damage(&self, label: BodyLabel) -> Option<u32> {
        match label {
            BodyLabel::Enemy { id } => self
                .enemy(id)
                .map(|e| self.config.enemies.stats(e.kind()).contact_damage),
            BodyLabel::Hazard { damage } => Some(damage),
            BodyLabel::Boss => self
                .boss
                .as_ref()
                .filter(|b| b.phase().is_fighting())
                .map(|_| self.config.boss.hazard_damage),
            BodyLabel::BossHazard => Some(self.config.boss.hazard_damage),
            _ => None,
        }
    }

    fn hurt_player(&mut self, amount: u32) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        match player.apply_damage(amount, &mut self.physics) {
            DamageOutcome::Safe | DamageOutcome::Ignored => {}
            DamageOutcome::Hurt { remaining } => {
                tracing::debug!(remaining, "player hurt");
                self.outbox.push(SessionEvent::LifeChanged { remaining });
            }
            DamageOutcome::Died => {
                let level = self.scene.level();
                tracing::info!(level, "player died");
                self.outbox.push(SessionEvent::LifeChanged { remaining: 0 });
                self.outbox.push(SessionEvent::PlayerDied { level });
                let payload = self.scene.game_over();
                let ticks = self.config.fade_out_ticks;
                self.scene.request_transition(payload, ticks, &mut self.outbox);
            }
        }
    }

    fn reach_exit(&mut self, door: BodyId) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let open = self.exit.as_ref().is_some_and(|exit| exit.body() == door && exit.is_open());
        if !open || player.exit_door() != Some(door) {
            return;
        }
        if !player.begin_transition(&mut self.physics) {
            return;
        }
        let payload = self.scene.level_cleared(player.life());
        let ticks = self.config.fade_out_ticks;
        self.scene.request_transition(payload, ticks, &mut self.outbox);
    }

    fn lever_pressed(&mut self, lever: LeverId) {
        let (pressed, total) = (self.levers.pressed_count(), self.levers.len());
        tracing::info!(%lever, pressed, total, "lever pressed");
        self.outbox.push(SessionEvent::LeverPressed {
            lever,
            pressed,
            total,
        });
        self.check_if_all_pressed();
    }

    /// Spawn the player's attack hit-box in front of it. Only one swing is
    /// alive at a time.
    fn swing(&mut self) {
        if self.hitboxes.iter().any(|h| h.owner == HitBoxOwner::Player) {
            return;
        }
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let Some(at) = self.physics.position(player.body()) else {
            tracing::warn!(body = %player.body(), "player body missing; swing skipped");
            return;
        };
        let attack = &self.config.player_attack;
        let (ux, uy) = heading(player.facing(), self.config.orientation_offset);
        let centre = Position::new(at.x + ux * attack.reach, at.y + uy * attack.reach);
        let desc = BodyDesc::sensor(
            BodyKind::Kinematic,
            ColliderShape::Circle {
                radius: attack.radius,
            },
        );
        let ttl = attack.lifetime_ticks.max(1);
        match self.spawn_labelled(&desc, centre, BodyLabel::PlayerAttack) {
            Ok(body) => {
                tracing::debug!(body = %body, "swing");
                self.hitboxes.push(HitBox {
                    body,
                    owner: HitBoxOwner::Player,
                    ttl,
                });
            }
            Err(e) => tracing::warn!(error = %e, "swing hit-box could not be spawned"),
        }
    }

    fn hit_enemy(&mut self, id: EnemyId) {
        let slot = id.0 as usize;
        let Some(enemy) = self.enemies.get_mut(slot).and_then(Option::as_mut) else {
            tracing::trace!(enemy = %id, "hit on an empty slot dropped");
            return;
        };
        let stats = self.config.enemies.stats(enemy.kind());
        match enemy.receive_hit(self.config.player_attack.damage, stats, &mut self.physics) {
            EnemyHit::Dropped => {}
            EnemyHit::Staggered { from, .. } => {
                if from != EnemyState::Stagger {
                    self.outbox.push(SessionEvent::EnemyStateChanged {
                        enemy: id,
                        from,
                        to: EnemyState::Stagger,
                    });
                }
            }
            EnemyHit::Killed { from } => {
                let body = enemy.body();
                self.enemies[slot] = None;
                self.despawn_labelled(body);
                tracing::info!(enemy = %id, "enemy died");
                self.outbox.push(SessionEvent::EnemyStateChanged {
                    enemy: id,
                    from,
                    to: EnemyState::Dead,
                });
                self.outbox.push(SessionEvent::EnemyDied { enemy: id });
            }
        }
    }

    fn engage_boss(&mut self) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let Some((from, to)) = boss.engage(&self.config.boss) else {
            return;
        };
        self.outbox.push(SessionEvent::BossPhaseChanged { from, to });
        if let Some(entrance) = self.entrance.as_mut() {
            close_door(entrance, &mut self.physics, &mut self.outbox);
        }
        self.outbox.push(SessionEvent::Audio {
            cue: AudioCue::BossMusicStart,
        });
    }

    fn hit_boss(&mut self) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let Some(hit) = boss.receive_hit(
            self.config.player_attack.boss_damage,
            &self.config.boss,
            &mut self.physics,
        ) else {
            return;
        };
        self.outbox.push(SessionEvent::BossDamaged { health: hit.health });
        for (from, to) in hit.changes {
            self.outbox.push(SessionEvent::BossPhaseChanged { from, to });
            if to == BossPhase::Defeated {
                self.boss_defeated();
            }
        }
    }

    fn boss_defeated(&mut self) {
        if let Some(exit) = self.exit.as_mut() {
            open_door(exit, &mut self.physics, &mut self.outbox);
        }
        if let Some(entrance) = self.entrance.as_mut() {
            open_door(entrance, &mut self.physics, &mut self.outbox);
        }
        self.outbox.push(SessionEvent::Audio {
            cue: AudioCue::BossMusicStop,
        });

        if let (Some(boss), Some(shape)) = (self.boss.as_ref(), self.boss_shape.as_ref()) {
            let body = boss.body();
            if let Err(e) = self.physics.set_collider(body, shape, true) {
                tracing::warn!(error = %e, "could not make the defeated boss inert");
            }
            self.labels.insert(body, BodyLabel::Decoration);
        }

        let thrown: Vec<BodyId> = self
            .hitboxes
            .iter()
            .filter(|h| h.owner == HitBoxOwner::Boss)
            .map(|h| h.body)
            .collect();
        self.hitboxes.retain(|h| h.owner != HitBoxOwner::Boss);
        for body in thrown {
            self.despawn_labelled(body);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("level", &self.scene.level())
            .field("bodies", &self.physics.body_count())
            .field("player", &self.player)
            .field("enemies", &self.enemies.iter().flatten().count())
            .field("boss", &self.boss)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
