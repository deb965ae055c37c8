//! Body handles and their allocation.
//!
//! A [`BodyId`] packs a *generation* counter in the high 32 bits and a slot
//! *index* in the low 32 bits. Despawning a body bumps the generation of its
//! slot, so a handle kept by gameplay code after the body is gone (an enemy
//! that died, a hit-box that expired) never aliases a newer body.
//!
//! Rapier gives every body two handles (rigid body and collider) and reports
//! contacts by collider. Gameplay needs one id per body that it can key its
//! label registry on, sort contacts by, and write into JSON reports, so the
//! world hands out `BodyId`s and keeps the rapier handles behind them.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// BodyId
// ---------------------------------------------------------------------------

/// A generational handle to a body in the [`PhysicsWorld`](crate::PhysicsWorld).
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(u64);

impl BodyId {
    /// Construct a `BodyId` from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// BodyAllocator
// ---------------------------------------------------------------------------

/// Hands out [`BodyId`]s and recycles their slots.
///
/// Freed slots are reused in FIFO order so a short-lived body (a hit-box
/// spawned every few frames) does not burn through the generations of a
/// single slot.
#[derive(Debug, Default)]
pub struct BodyAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_slots: VecDeque<u32>,
}

impl BodyAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle, reusing the oldest free slot if there is one.
    pub fn allocate(&mut self) -> BodyId {
        if let Some(index) = self.free_slots.pop_front() {
            self.alive[index as usize] = true;
            BodyId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            BodyId::new(index, 0)
        }
    }

    /// Release a handle. Returns `false` if it was already released or stale.
    pub fn release(&mut self, id: BodyId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_slots.push_back(id.index());
        true
    }

    /// Whether `id` names a live body.
    pub fn is_alive(&self, id: BodyId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation()
    }

    /// Number of live handles.
    pub fn alive_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_unique_slots() {
        let mut alloc = BodyAllocator::new();
        let mut indices: Vec<u32> = (0..64).map(|_| alloc.allocate().index()).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), 64);
    }

    #[test]
    fn released_slot_comes_back_with_next_generation() {
        let mut alloc = BodyAllocator::new();
        let hitbox = alloc.allocate();
        assert!(alloc.release(hitbox));
        let next = alloc.allocate();
        assert_eq!(next.index(), hitbox.index());
        assert_eq!(next.generation(), 1);
        assert!(!alloc.is_alive(hitbox), "old handle must stay stale");
        assert!(alloc.is_alive(next));
    }

    #[test]
    fn double_release_is_rejected() {
        let mut alloc = BodyAllocator::new();
        let id = alloc.allocate();
        assert!(alloc.release(id));
        assert!(!alloc.release(id));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn display_and_raw_roundtrip() {
        let id = BodyId::new(12, 3);
        assert_eq!(id.to_string(), "12v3");
        assert_eq!(BodyId::from_raw(id.to_raw()), id);
    }
}
