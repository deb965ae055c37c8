//! rapier2d world wrapper with a gameplay-facing contact stream.
//!
//! The [`PhysicsWorld`] owns a zero-gravity rapier2d simulation. Gameplay code
//! never touches rapier handles; it works with [`BodyId`]s and gets back a
//! sorted list of [`Contact`]s from every [`step`](PhysicsWorld::step):
//!
//! 1. Velocities set by gameplay since the last step are integrated.
//! 2. rapier reports collision starts and stops through a channel.
//! 3. Events are mapped back to [`BodyId`]s and sorted by
//!    `(min, max, phase)` so that the contact order does not depend on
//!    rapier's channel delivery order.
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`. With a fixed timestep and
//! the contact sort above, the same inputs produce the same contact sequence.

use std::collections::HashMap;

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::{BodyAllocator, BodyId};
use crate::PhysicsError;

// ---------------------------------------------------------------------------
// Descriptor types
// ---------------------------------------------------------------------------

/// 2D position in screen-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downwards).
    pub y: f64,
}

impl Position {
    /// Shorthand constructor.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 2D linear velocity in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal velocity.
    pub dx: f64,
    /// Vertical velocity.
    pub dy: f64,
}

impl Velocity {
    /// The zero velocity.
    pub const ZERO: Velocity = Velocity { dx: 0.0, dy: 0.0 };

    /// Shorthand constructor.
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Euclidean length.
    pub fn speed(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

/// How rapier treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Simulated by the solver (player, pushable crates).
    Dynamic,
    /// Moved by gameplay through its velocity, ignores the solver (phantoms,
    /// hit-boxes).
    Kinematic,
    /// Never moves (walls, triggers, doors).
    Static,
}

/// Collider geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderShape {
    /// Axis-aligned box with half-extents.
    Box {
        /// Half-width along x.
        half_width: f64,
        /// Half-height along y.
        half_height: f64,
    },
    /// Circle.
    Circle {
        /// Radius.
        radius: f64,
    },
    /// Convex hull of the given points, relative to the body position.
    Polygon {
        /// Hull vertices as `[x, y]` pairs.
        points: Vec<[f64; 2]>,
    },
}

impl ColliderShape {
    fn to_shared(&self) -> Result<SharedShape, PhysicsError> {
        match self {
            ColliderShape::Box {
                half_width,
                half_height,
            } => Ok(SharedShape::cuboid(*half_width as Real, *half_height as Real)),
            ColliderShape::Circle { radius } => Ok(SharedShape::ball(*radius as Real)),
            ColliderShape::Polygon { points } => {
                let hull: Vec<Point<Real>> = points
                    .iter()
                    .map(|[x, y]| point![*x as Real, *y as Real])
                    .collect();
                if hull.len() < 3 {
                    return Err(PhysicsError::DegenerateShape {
                        vertices: hull.len(),
                    });
                }
                SharedShape::convex_hull(&hull).ok_or(PhysicsError::DegenerateShape {
                    vertices: hull.len(),
                })
            }
        }
    }
}

/// Everything needed to spawn a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    /// Body type.
    pub kind: BodyKind,
    /// Collider geometry.
    pub shape: ColliderShape,
    /// Sensors report overlaps but produce no contact response.
    #[serde(default)]
    pub is_sensor: bool,
    /// Keep the body upright (isometric sprites never rotate).
    #[serde(default)]
    pub lock_rotation: bool,
    /// Linear damping; lets pushed crates come to rest.
    #[serde(default)]
    pub linear_damping: f64,
}

impl BodyDesc {
    /// A solid body of the given kind.
    pub fn solid(kind: BodyKind, shape: ColliderShape) -> Self {
        Self {
            kind,
            shape,
            is_sensor: false,
            lock_rotation: true,
            linear_damping: 0.0,
        }
    }

    /// A sensor body of the given kind.
    pub fn sensor(kind: BodyKind, shape: ColliderShape) -> Self {
        Self {
            is_sensor: true,
            ..Self::solid(kind, shape)
        }
    }

    /// Builder-style damping override.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.linear_damping = damping;
        self
    }
}

// ---------------------------------------------------------------------------
// Contact stream
// ---------------------------------------------------------------------------

/// Whether two bodies began or ceased touching during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    /// The bodies started touching (or overlapping, for sensors).
    Started,
    /// The bodies stopped touching.
    Stopped,
}

/// A contact between two live bodies, raised by one physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// First body of the pair.
    pub a: BodyId,
    /// Second body of the pair.
    pub b: BodyId,
    /// Start or stop.
    pub phase: ContactPhase,
    /// At least one of the colliders is a sensor.
    pub sensor: bool,
}

impl Contact {
    /// A contact with the pair stored in the given order.
    pub fn new(a: BodyId, b: BodyId, phase: ContactPhase, sensor: bool) -> Self {
        Self {
            a,
            b,
            phase,
            sensor,
        }
    }

    /// The same contact with `a` and `b` swapped.
    pub fn swapped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            ..self
        }
    }

    fn sort_key(&self) -> (BodyId, BodyId, ContactPhase) {
        (self.a.min(self.b), self.a.max(self.b), self.phase)
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

struct BodyHandles {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// A zero-gravity rapier2d world addressed by [`BodyId`].
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    allocator: BodyAllocator,
    handles: HashMap<BodyId, BodyHandles>,
    collider_to_body: HashMap<ColliderHandle, BodyId>,
}

impl PhysicsWorld {
    /// Create an empty world without gravity (top-down/isometric play).
    pub fn new_zero_gravity() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, 0.0],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            allocator: BodyAllocator::new(),
            handles: HashMap::new(),
            collider_to_body: HashMap::new(),
        }
    }

    /// Spawn a body at `position` and return its handle.
    ///
    /// Fails only if the collider shape is degenerate; nothing is inserted in
    /// that case.
    pub fn spawn(&mut self, desc: &BodyDesc, position: Position) -> Result<BodyId, PhysicsError> {
        let shape = desc.shape.to_shared()?;

        let translation = vector![position.x as Real, position.y as Real];
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let mut builder = builder
            .translation(translation)
            .linear_damping(desc.linear_damping as Real);
        if desc.lock_rotation {
            builder = builder.lock_rotations();
        }
        let body = self.rigid_body_set.insert(builder.build());

        let collider = ColliderBuilder::new(shape)
            .sensor(desc.is_sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_collision_types(ActiveCollisionTypes::all())
            .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);

        let id = self.allocator.allocate();
        self.handles.insert(id, BodyHandles { body, collider });
        self.collider_to_body.insert(collider, id);
        tracing::trace!(body = %id, kind = ?desc.kind, sensor = desc.is_sensor, "spawned body");
        Ok(id)
    }

    /// Remove a body and its collider. Unknown or stale handles are a no-op
    /// and return `false`.
    pub fn despawn(&mut self, id: BodyId) -> bool {
        let Some(handles) = self.handles.remove(&id) else {
            return false;
        };
        self.collider_to_body.remove(&handles.collider);
        self.rigid_body_set.remove(
            handles.body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.allocator.release(id);
        true
    }

    /// Set the linear velocity of a body. Static bodies ignore this.
    pub fn set_velocity(&mut self, id: BodyId, velocity: Velocity) {
        if let Some(rb) = self.body_mut(id) {
            rb.set_linvel(vector![velocity.dx as Real, velocity.dy as Real], true);
        }
    }

    /// Current linear velocity, if the body exists.
    pub fn velocity(&self, id: BodyId) -> Option<Velocity> {
        self.body(id).map(|rb| {
            let v = rb.linvel();
            Velocity::new(v.x as f64, v.y as f64)
        })
    }

    /// Current position, if the body exists.
    pub fn position(&self, id: BodyId) -> Option<Position> {
        self.body(id).map(|rb| {
            let t = rb.translation();
            Position::new(t.x as f64, t.y as f64)
        })
    }

    /// Swap a body's collider geometry and sensor flag in place.
    ///
    /// The collider keeps its handle, so contacts already reported against
    /// the body stay attributable. Used by doors, whose solid "closed" shape
    /// becomes a sensor "open" shape when they unlock.
    pub fn set_collider(
        &mut self,
        id: BodyId,
        shape: &ColliderShape,
        is_sensor: bool,
    ) -> Result<(), PhysicsError> {
        let handle = self
            .handles
            .get(&id)
            .map(|h| h.collider)
            .ok_or(PhysicsError::UnknownBody(id))?;
        let shape = shape.to_shared()?;
        let collider = self
            .collider_set
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(id))?;
        collider.set_shape(shape);
        collider.set_sensor(is_sensor);
        Ok(())
    }

    /// Whether the body's collider is currently a sensor.
    pub fn is_sensor(&self, id: BodyId) -> Option<bool> {
        let handle = self.handles.get(&id)?.collider;
        self.collider_set.get(handle).map(|c| c.is_sensor())
    }

    /// Advance the simulation by `dt` seconds and return the contacts that
    /// started or stopped during the step, in deterministic order.
    pub fn step(&mut self, dt: f64) -> Vec<Contact> {
        self.integration_params.dt = dt as Real;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut contacts = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            let (h1, h2, flags, phase) = match event {
                CollisionEvent::Started(h1, h2, flags) => (h1, h2, flags, ContactPhase::Started),
                CollisionEvent::Stopped(h1, h2, flags) => (h1, h2, flags, ContactPhase::Stopped),
            };
            match (
                self.collider_to_body.get(&h1).copied(),
                self.collider_to_body.get(&h2).copied(),
            ) {
                (Some(a), Some(b)) => contacts.push(Contact::new(
                    a,
                    b,
                    phase,
                    flags.contains(CollisionEventFlags::SENSOR),
                )),
                _ => tracing::trace!(?phase, "dropping contact with a removed body"),
            }
        }

        contacts.sort_by_key(Contact::sort_key);
        contacts
    }

    /// Whether `id` names a live body.
    pub fn has_body(&self, id: BodyId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn body(&self, id: BodyId) -> Option<&RigidBody> {
        let handle = self.handles.get(&id)?.body;
        self.rigid_body_set.get(handle)
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let handle = self.handles.get(&id)?.body;
        self.rigid_body_set.get_mut(handle)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new_zero_gravity()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
