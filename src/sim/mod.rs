//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only enters through the `dt` passed to `tick`
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering, input or persistence dependencies

pub mod collision;
pub mod entity;
pub mod pool;
pub mod state;
pub mod tick;

pub use collision::{
    Aabb, CrashCause, check_obstacle_collision, check_world_bounds, try_score_pair, update_scoring,
};
pub use entity::Entity;
pub use pool::{ObstaclePair, ObstaclePool, PairHandle, SlotState, Spawner};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{Signal, apply_signal, end_run, tick};
