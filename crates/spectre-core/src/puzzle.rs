//! Levers and doors.
//!
//! Levers only ever go from unpressed to pressed within a session. The exit
//! door of a lever level opens once, the first time every lever is pressed,
//! and never closes again. A door's collider always matches its logical
//! state: closed doors are solid, open doors are sensors with their own shape.

use serde::{Deserialize, Serialize};
use spectre_physics::{BodyDesc, BodyId, BodyKind, ColliderShape, PhysicsError, PhysicsWorld, Position};

use crate::events::SessionEvent;

// ---------------------------------------------------------------------------
// Levers
// ---------------------------------------------------------------------------

/// Index of a lever in authoring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeverId(pub u32);

impl std::fmt::Display for LeverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lever#{}", self.0)
    }
}

/// A single lever.
#[derive(Debug, Clone)]
pub struct Lever {
    pub id: LeverId,
    pub body: BodyId,
    pressed: bool,
}

impl Lever {
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// The lever set of a level.
#[derive(Debug, Clone, Default)]
pub struct LeverTracker {
    levers: Vec<Lever>,
}

impl LeverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next lever in authoring order.
    pub fn add(&mut self, body: BodyId) -> LeverId {
        let id = LeverId(self.levers.len() as u32);
        self.levers.push(Lever {
            id,
            body,
            pressed: false,
        });
        id
    }

    /// Press a lever. Returns `true` only the first time; unknown ids and
    /// already pressed levers are ignored.
    pub fn press(&mut self, id: LeverId) -> bool {
        match self.levers.get_mut(id.0 as usize) {
            Some(lever) if !lever.pressed => {
                lever.pressed = true;
                true
            }
            _ => false,
        }
    }

    /// Whether every lever is pressed. Vacuously true with no levers.
    pub fn all_pressed(&self) -> bool {
        self.levers.iter().all(|l| l.pressed)
    }

    pub fn is_pressed(&self, id: LeverId) -> bool {
        self.levers
            .get(id.0 as usize)
            .is_some_and(|l| l.pressed)
    }

    pub fn pressed_count(&self) -> usize {
        self.levers.iter().filter(|l| l.pressed).count()
    }

    pub fn len(&self) -> usize {
        self.levers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levers.is_empty()
    }

    /// Pressed flags in authoring order, for the HUD.
    pub fn pressed_flags(&self) -> Vec<bool> {
        self.levers.iter().map(|l| l.pressed).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lever> {
        self.levers.iter()
    }
}

// ---------------------------------------------------------------------------
// Doors
// ---------------------------------------------------------------------------

/// Which door of the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorRole {
    /// Leads to the next level.
    Exit,
    /// The way the player came in.
    Entrance,
}

/// A door whose collider follows its open flag.
#[derive(Debug, Clone)]
pub struct Door {
    role: DoorRole,
    body: BodyId,
    open: bool,
    closed_shape: ColliderShape,
    open_shape: ColliderShape,
}

impl Door {
    /// Spawn a static door body in the given state.
    pub fn spawn(
        physics: &mut PhysicsWorld,
        role: DoorRole,
        position: Position,
        closed_shape: ColliderShape,
        open_shape: ColliderShape,
        open: bool,
    ) -> Result<Self, PhysicsError> {
        let desc = if open {
            BodyDesc::sensor(BodyKind::Static, open_shape.clone())
        } else {
            BodyDesc::solid(BodyKind::Static, closed_shape.clone())
        };
        let body = physics.spawn(&desc, position)?;
        Ok(Self {
            role,
            body,
            open,
            closed_shape,
            open_shape,
        })
    }

    pub fn role(&self) -> DoorRole {
        self.role
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the door. Idempotent: returns `Ok(false)` if it already was.
    pub fn open(&mut self, physics: &mut PhysicsWorld) -> Result<bool, PhysicsError> {
        self.set_open(physics, true)
    }

    /// Close the door. Idempotent: returns `Ok(false)` if it already was.
    pub fn close(&mut self, physics: &mut PhysicsWorld) -> Result<bool, PhysicsError> {
        self.set_open(physics, false)
    }

    fn set_open(&mut self, physics: &mut PhysicsWorld, open: bool) -> Result<bool, PhysicsError> {
        if self.open == open {
            return Ok(false);
        }
        // Collider first: if the swap fails the logical state stays put.
        let shape = if open { &self.open_shape } else { &self.closed_shape };
        physics.set_collider(self.body, shape, open)?;
        self.open = open;
        Ok(true)
    }
}

/// Open `door` and record the event if it actually changed.
pub(crate) fn open_door(
    door: &mut Door,
    physics: &mut PhysicsWorld,
    events: &mut Vec<SessionEvent>,
) -> bool {
    match door.open(physics) {
        Ok(true) => {
            tracing::info!(door = ?door.role(), "door opened");
            events.push(SessionEvent::DoorOpened { door: door.role() });
            true
        }
        Ok(false) => false,
        Err(e) => {
            tracing::warn!(door = ?door.role(), error = %e, "door collider swap failed; keeping it closed");
            false
        }
    }
}

/// Close `door` and record the event if it actually changed.
pub(crate) fn close_door(
    door: &mut Door,
    physics: &mut PhysicsWorld,
    events: &mut Vec<SessionEvent>,
) -> bool {
    match door.close(physics) {
        Ok(true) => {
            tracing::info!(door = ?door.role(), "door closed");
            events.push(SessionEvent::DoorClosed { door: door.role() });
            true
        }
        Ok(false) => false,
        Err(e) => {
            tracing::warn!(door = ?door.role(), error = %e, "door collider swap failed; keeping it open");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes() -> (ColliderShape, ColliderShape) {
        (
            ColliderShape::Box {
                half_width: 16.0,
                half_height: 8.0,
            },
            ColliderShape::Box {
                half_width: 12.0,
                half_height: 4.0,
            },
        )
    }

    #[test]
    fn levers_are_monotonic() {
        let mut levers = LeverTracker::new();
        let a = levers.add(BodyId::new(0, 0));
        let b = levers.add(BodyId::new(1, 0));

        assert!(!levers.all_pressed());
        assert!(levers.press(a));
        assert!(!levers.press(a), "second press is a no-op");
        assert!(levers.is_pressed(a));
        assert!(!levers.all_pressed());
        assert!(levers.press(b));
        assert!(levers.all_pressed());
        assert_eq!(levers.pressed_flags(), vec![true, true]);
    }

    #[test]
    fn empty_lever_set_counts_as_all_pressed() {
        assert!(LeverTracker::new().all_pressed());
    }

    #[test]
    fn unknown_lever_is_ignored() {
        let mut levers = LeverTracker::new();
        levers.add(BodyId::new(0, 0));
        assert!(!levers.press(LeverId(7)));
        assert_eq!(levers.pressed_count(), 0);
    }

    #[test]
    fn door_collider_tracks_open_flag() {
        let mut physics = PhysicsWorld::new_zero_gravity();
        let (closed, open) = shapes();
        let mut door = Door::spawn(
            &mut physics,
            DoorRole::Exit,
            Position::new(100.0, 0.0),
            closed,
            open,
            false,
        )
        .unwrap();

        assert!(!door.is_open());
        assert_eq!(physics.is_sensor(door.body()), Some(false));

        assert!(door.open(&mut physics).unwrap());
        assert!(door.is_open());
        assert_eq!(physics.is_sensor(door.body()), Some(true));

        assert!(!door.open(&mut physics).unwrap(), "double unlock is a no-op");

        assert!(door.close(&mut physics).unwrap());
        assert_eq!(physics.is_sensor(door.body()), Some(false));
    }

    #[test]
    fn open_door_helper_emits_once() {
        let mut physics = PhysicsWorld::new_zero_gravity();
        let (closed, open) = shapes();
        let mut door =
            Door::spawn(&mut physics, DoorRole::Exit, Position::default(), closed, open, false)
                .unwrap();
        let mut events = Vec::new();

        assert!(open_door(&mut door, &mut physics, &mut events));
        assert!(!open_door(&mut door, &mut physics, &mut events));
        assert_eq!(events, vec![SessionEvent::DoorOpened { door: DoorRole::Exit }]);
    }
}
