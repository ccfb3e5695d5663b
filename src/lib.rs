//! Flap Core - deterministic simulation for a side-scrolling flap-and-dodge game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity physics, obstacle pool, judge, state machine)
//! - `clock`: Converts frame callbacks into simulation steps
//! - `simulation`: Host-facing facade (signals, snapshots, game-over callback)
//! - `config`: Data-driven tuning
//! - `highscores`: High score key-value store collaborator

pub mod clock;
pub mod config;
pub mod highscores;
pub mod sim;
pub mod simulation;

pub use clock::{FrameClock, StepMode, StepPlan};
pub use config::{CeilingPolicy, ConfigError, ScoreCrossing, SimConfig, TimeUnit};
pub use highscores::{JsonFileStore, MemoryStore, ScoreStore, StoreError};
pub use simulation::{ObstacleView, Simulation, Snapshot};

/// Default tuning constants (per-second units unless noted)
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest delta accepted by the variable-step integrator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Logical world dimensions
    pub const WORLD_WIDTH: f32 = 540.0;
    pub const WORLD_HEIGHT: f32 = 960.0;

    /// Entity defaults
    pub const ENTITY_X: f32 = WORLD_WIDTH * 0.2;
    pub const ENTITY_START_Y: f32 = WORLD_HEIGHT / 2.0;
    pub const ENTITY_SIZE: f32 = 48.0;
    pub const GRAVITY: f32 = 1000.0;
    pub const FLAP_VELOCITY: f32 = -400.0;
    /// Rotation caps (radians)
    pub const MAX_UP_ANGLE: f32 = 20.0 * std::f32::consts::PI / 180.0;
    pub const MAX_DOWN_ANGLE: f32 = std::f32::consts::FRAC_PI_2;
    /// Radians of tilt per unit of velocity
    pub const ROTATION_PER_VELOCITY: f32 = 0.0035;

    /// Obstacle defaults
    pub const OBSTACLE_SPEED: f32 = 150.0;
    pub const OBSTACLE_WIDTH: f32 = 80.0;
    pub const GAP_HEIGHT: f32 = 320.0;
    pub const GAP_MARGIN: f32 = 75.0;
    pub const SPAWN_INTERVAL_MS: f32 = 1500.0;
    pub const POOL_SIZE: usize = 10;
}

/// Replace a non-finite or negative timestep with zero
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_dt() {
        assert_eq!(sanitize_dt(0.016), 0.016);
        assert_eq!(sanitize_dt(-1.0), 0.0);
        assert_eq!(sanitize_dt(f32::NAN), 0.0);
        assert_eq!(sanitize_dt(f32::INFINITY), 0.0);
    }
}
