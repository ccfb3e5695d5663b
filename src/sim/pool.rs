//! Obstacle pool and spawner
//!
//! Pairs live in a fixed arena allocated once; spawning flips the first
//! inactive slot to active and retiring flips it back. Nothing is allocated
//! or freed while a run is in progress.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::config::SimConfig;

/// Slot activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotState {
    #[default]
    Inactive,
    Active,
}

/// Index of a slot in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairHandle(pub usize);

/// Two obstacle halves sharing one gap and one horizontal position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePair {
    /// Left edge of both halves
    pub x: f32,
    pub width: f32,
    pub gap_center_y: f32,
    pub gap_height: f32,
    pub state: SlotState,
    pub scored: bool,
}

impl ObstaclePair {
    /// Reposition a slot for a fresh run across the screen
    pub fn place(&mut self, x: f32, gap_center_y: f32, gap_height: f32, width: f32) {
        self.x = x;
        self.gap_center_y = gap_center_y;
        self.gap_height = gap_height;
        self.width = width;
        self.scored = false;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == SlotState::Active
    }

    /// Rear edge in the scroll direction; passing it clears the pair
    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn gap_top(&self) -> f32 {
        self.gap_center_y - self.gap_height / 2.0
    }

    #[inline]
    pub fn gap_bottom(&self) -> f32 {
        self.gap_center_y + self.gap_height / 2.0
    }

    /// Top and bottom collision boxes
    pub fn boxes(&self, world_height: f32) -> (Aabb, Aabb) {
        let right = self.trailing_edge();
        let top = Aabb::new(Vec2::new(self.x, 0.0), Vec2::new(right, self.gap_top()));
        let bottom = Aabb::new(
            Vec2::new(self.x, self.gap_bottom()),
            Vec2::new(right, world_height),
        );
        (top, bottom)
    }

    /// Fully past the left world boundary
    #[inline]
    pub fn is_offscreen(&self) -> bool {
        self.x < -self.width
    }
}

/// Fixed-capacity arena of obstacle pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstaclePool {
    slots: Vec<ObstaclePair>,
}

impl ObstaclePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![ObstaclePair::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|p| p.is_active()).count()
    }

    /// Claim the first inactive slot, or None if every slot is in use
    pub fn acquire(&mut self) -> Option<PairHandle> {
        let index = self.slots.iter().position(|p| !p.is_active())?;
        let slot = &mut self.slots[index];
        slot.state = SlotState::Active;
        slot.scored = false;
        Some(PairHandle(index))
    }

    /// Return a slot to the pool. Releasing an inactive slot is a no-op.
    pub fn release(&mut self, handle: PairHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0) {
            slot.state = SlotState::Inactive;
        }
    }

    /// Deactivate every slot (run reset)
    pub fn release_all(&mut self) {
        for slot in &mut self.slots {
            slot.state = SlotState::Inactive;
            slot.scored = false;
        }
    }

    pub fn get(&self, handle: PairHandle) -> Option<&ObstaclePair> {
        self.slots.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: PairHandle) -> Option<&mut ObstaclePair> {
        self.slots.get_mut(handle.0)
    }

    /// Active pairs in slot order
    pub fn iter_active(&self) -> impl Iterator<Item = &ObstaclePair> {
        self.slots.iter().filter(|p| p.is_active())
    }

    /// Active pairs with their handles, in slot order
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (PairHandle, &mut ObstaclePair)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, p)| p.is_active())
            .map(|(i, p)| (PairHandle(i), p))
    }

    /// Activate a pair at the right edge with a random gap.
    ///
    /// Returns None, leaving the pool untouched, if the pool is exhausted.
    pub fn spawn_pair<R: Rng>(&mut self, config: &SimConfig, rng: &mut R) -> Option<PairHandle> {
        let Some(handle) = self.acquire() else {
            log::warn!(
                "Obstacle pool exhausted ({} active), skipping spawn",
                self.capacity()
            );
            return None;
        };

        let gap_center_y = random_gap_center(config, rng);
        let slot = &mut self.slots[handle.0];
        slot.place(
            config.world_width,
            gap_center_y,
            config.gap_height,
            config.obstacle_width,
        );
        log::debug!("Spawned pair {} with gap at {:.1}", handle.0, gap_center_y);
        Some(handle)
    }

    /// Scroll every active pair left
    pub fn advance(&mut self, speed: f32, dt: f32) {
        let dx = speed * crate::sanitize_dt(dt);
        for (_, pair) in self.iter_active_mut() {
            pair.x -= dx;
        }
    }

    /// Deactivate pairs that left the screen; calls `on_retire` for each
    pub fn retire_offscreen(&mut self, mut on_retire: impl FnMut(PairHandle)) -> usize {
        let mut retired = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_active() && slot.is_offscreen() {
                slot.state = SlotState::Inactive;
                retired += 1;
                on_retire(PairHandle(index));
            }
        }
        retired
    }
}

/// Gap center drawn uniformly from the band that keeps the gap `gap_margin`
/// away from the ceiling and the floor
pub fn random_gap_center<R: Rng>(config: &SimConfig, rng: &mut R) -> f32 {
    let half_gap = config.gap_height / 2.0;
    let low = config.gap_margin + half_gap;
    let high = config.floor_y() - config.gap_margin - half_gap;
    if high <= low {
        return (low + high) / 2.0;
    }
    rng.random_range(low..=high)
}

/// Spawn timer driven by simulated time
///
/// Counts milliseconds since the last spawn in f64 so long runs don't drift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spawner {
    since_last_ms: f64,
}

/// Absorbs float error when a frame lands exactly on an interval boundary
const SPAWN_EPSILON_MS: f64 = 1e-6;

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.since_last_ms = 0.0;
    }

    /// Milliseconds accumulated toward the next spawn
    pub fn since_last_ms(&self) -> f64 {
        self.since_last_ms
    }

    /// Advance the timer and return how many spawns fell due
    pub fn tick(&mut self, elapsed_ms: f64, interval_ms: f64) -> u32 {
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 || interval_ms <= 0.0 {
            return 0;
        }
        self.since_last_ms += elapsed_ms;
        let mut due = 0;
        while self.since_last_ms + SPAWN_EPSILON_MS >= interval_ms {
            self.since_last_ms = (self.since_last_ms - interval_ms).max(0.0);
            due += 1;
        }
        due
    }
}
