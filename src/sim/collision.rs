//! Collision and scoring judge
//!
//! Boxes are axis-aligned and overlap tests are strict on all four edges:
//! touching edges are not a collision. Scoring is per pair, never per half.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::pool::{ObstaclePair, PairHandle};
use crate::config::{CeilingPolicy, ScoreCrossing, SimConfig};

/// Axis-aligned bounding box (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Strict overlap on both axes
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    Floor,
    Ceiling,
    Obstacle,
}

/// Which bound, if any, the entity has crossed: the floor, or the ceiling
/// when it is lethal
pub fn check_world_bounds(entity: &Entity, config: &SimConfig) -> Option<CrashCause> {
    let bounds = entity.bounds();
    if bounds.max.y > config.floor_y() {
        return Some(CrashCause::Floor);
    }
    if config.ceiling == CeilingPolicy::Lethal && bounds.min.y < 0.0 {
        return Some(CrashCause::Ceiling);
    }
    None
}

/// True if the entity's box overlaps either half of a pair
#[inline]
pub fn pair_collides(hitbox: &Aabb, pair: &ObstaclePair, world_height: f32) -> bool {
    let (top, bottom) = pair.boxes(world_height);
    hitbox.overlaps(&top) || hitbox.overlaps(&bottom)
}

/// Position, in iteration order, of the first pair the entity's hitbox
/// overlaps. None means the entity is clear of every pair.
pub fn check_obstacle_collision<'a>(
    entity: &Entity,
    pairs: impl IntoIterator<Item = &'a ObstaclePair>,
    config: &SimConfig,
) -> Option<usize> {
    let hitbox = entity.hitbox(config);
    pairs
        .into_iter()
        .position(|pair| pair_collides(&hitbox, pair, config.world_height))
}

/// Mark a pair scored if the entity has passed its trailing edge.
/// Returns true only on the transition, so a pair contributes at most once.
#[inline]
pub fn try_score_pair(pair: &mut ObstaclePair, entity_x: f32, crossing: ScoreCrossing) -> bool {
    if pair.scored || !crossing.crossed(pair.trailing_edge(), entity_x) {
        return false;
    }
    pair.scored = true;
    true
}

/// Score every passed pair once, calling `on_score` with the pair and the
/// new total. Returns how many were newly scored.
pub fn update_scoring<'a>(
    entity: &Entity,
    pairs: impl IntoIterator<Item = (PairHandle, &'a mut ObstaclePair)>,
    crossing: ScoreCrossing,
    score: &mut u64,
    mut on_score: impl FnMut(PairHandle, u64),
) -> u32 {
    let mut newly_scored = 0;
    for (handle, pair) in pairs {
        if try_score_pair(pair, entity.pos.x, crossing) {
            *score += 1;
            newly_scored += 1;
            on_score(handle, *score);
        }
    }
    newly_scored
}
