//! Simulation tuning and configuration
//!
//! Every constant the simulation reads lives in [`SimConfig`], so hosts can
//! swap between the per-second and per-frame calibrations without touching
//! the simulation code. Loaded from JSON by hosts that want data-driven tuning.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Unit of the `dt` fed to the simulation
///
/// Gravity, flap velocity and obstacle speed are calibrated in this unit.
/// Mixing units inside one configuration is a bug, so conversion happens
/// once, at the clock boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeUnit {
    /// `dt` is in seconds, constants are per second
    Seconds,
    /// `dt` is in frames, constants are per frame
    Frames { frames_per_second: f32 },
}

impl TimeUnit {
    /// Convert elapsed wall time to simulation units
    pub fn from_seconds(self, secs: f32) -> f32 {
        match self {
            TimeUnit::Seconds => secs,
            TimeUnit::Frames { frames_per_second } => secs * frames_per_second,
        }
    }

    /// Convert a simulation `dt` to milliseconds (spawn timer bookkeeping)
    pub fn to_millis(self, dt: f32) -> f64 {
        match self {
            TimeUnit::Seconds => dt as f64 * 1000.0,
            TimeUnit::Frames { frames_per_second } => dt as f64 * 1000.0 / frames_per_second as f64,
        }
    }
}

/// What happens when the entity reaches the ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeilingPolicy {
    /// Crossing the ceiling ends the run
    #[default]
    Lethal,
    /// The entity is held at the ceiling and its velocity zeroed
    Clamp,
}

/// When a pair counts as cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCrossing {
    /// Trailing edge strictly behind the entity x
    #[default]
    Strict,
    /// Trailing edge at or behind the entity x
    Inclusive,
}

impl ScoreCrossing {
    #[inline]
    pub fn crossed(self, trailing_edge: f32, entity_x: f32) -> bool {
        match self {
            ScoreCrossing::Strict => trailing_edge < entity_x,
            ScoreCrossing::Inclusive => trailing_edge <= entity_x,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Complete simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    /// Height of the ground strip; the floor sits at `world_height - floor_inset`
    pub floor_inset: f32,
    pub ceiling: CeilingPolicy,
    pub time_unit: TimeUnit,

    // === Entity ===
    pub entity_x: f32,
    pub entity_start_y: f32,
    pub entity_width: f32,
    pub entity_height: f32,
    /// Shrinks the collision box on every side
    pub hitbox_inset: f32,
    pub gravity: f32,
    /// Velocity written by a flap (negative = up)
    pub flap_velocity: f32,
    pub terminal_velocity: Option<f32>,
    pub rotation_per_velocity: f32,
    pub max_up_angle: f32,
    pub max_down_angle: f32,

    // === Obstacles ===
    pub obstacle_speed: f32,
    pub obstacle_width: f32,
    pub gap_height: f32,
    /// Minimum clearance between the gap and the top/bottom bounds
    pub gap_margin: f32,
    pub spawn_interval_ms: f32,
    pub pool_size: usize,
    pub score_crossing: ScoreCrossing,

    /// Seed for gap placement
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::arcade()
    }
}

impl SimConfig {
    /// Per-second calibration (physics-engine variant)
    pub fn arcade() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            floor_inset: 0.0,
            ceiling: CeilingPolicy::Lethal,
            time_unit: TimeUnit::Seconds,

            entity_x: ENTITY_X,
            entity_start_y: ENTITY_START_Y,
            entity_width: ENTITY_SIZE,
            entity_height: ENTITY_SIZE,
            hitbox_inset: 0.0,
            gravity: GRAVITY,
            flap_velocity: FLAP_VELOCITY,
            terminal_velocity: None,
            rotation_per_velocity: ROTATION_PER_VELOCITY,
            max_up_angle: MAX_UP_ANGLE,
            max_down_angle: MAX_DOWN_ANGLE,

            obstacle_speed: OBSTACLE_SPEED,
            obstacle_width: OBSTACLE_WIDTH,
            gap_height: GAP_HEIGHT,
            gap_margin: GAP_MARGIN,
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            pool_size: POOL_SIZE,
            score_crossing: ScoreCrossing::Strict,

            seed: 0,
        }
    }

    /// Per-frame calibration at 60 fps (canvas variant)
    pub fn classic() -> Self {
        Self {
            floor_inset: 80.0,
            ceiling: CeilingPolicy::Clamp,
            time_unit: TimeUnit::Frames {
                frames_per_second: 60.0,
            },
            entity_x: 80.0,
            entity_start_y: 300.0,
            entity_width: 40.0,
            entity_height: 40.0,
            gravity: 0.28,
            flap_velocity: -7.0,
            terminal_velocity: Some(8.0),
            rotation_per_velocity: 0.2,
            max_up_angle: std::f32::consts::FRAC_PI_6,
            obstacle_speed: 2.5,
            gap_height: 160.0,
            gap_margin: 50.0,
            ..Self::arcade()
        }
    }

    /// Y of the floor the entity must stay above
    #[inline]
    pub fn floor_y(&self) -> f32 {
        self.world_height - self.floor_inset
    }

    /// Parse and validate a JSON config; missing fields fall back to `arcade()`
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the configuration describes a playable world
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;

        if !positive(self.world_width) {
            return Err(invalid("world_width", "must be finite and positive"));
        }
        if !positive(self.world_height) {
            return Err(invalid("world_height", "must be finite and positive"));
        }
        if !non_negative(self.floor_inset) || self.floor_inset >= self.world_height {
            return Err(invalid("floor_inset", "must be non-negative and below world_height"));
        }
        if let TimeUnit::Frames { frames_per_second } = self.time_unit {
            if !positive(frames_per_second) {
                return Err(invalid("time_unit", "frames_per_second must be positive"));
            }
        }
        if !positive(self.entity_width) || !positive(self.entity_height) {
            return Err(invalid("entity_size", "must be finite and positive"));
        }
        if !non_negative(self.hitbox_inset)
            || self.hitbox_inset * 2.0 >= self.entity_width.min(self.entity_height)
        {
            return Err(invalid("hitbox_inset", "must leave a non-empty hitbox"));
        }
        if !self.entity_x.is_finite() || self.entity_x < 0.0 || self.entity_x > self.world_width {
            return Err(invalid("entity_x", "must lie inside the world"));
        }
        if !self.entity_start_y.is_finite()
            || self.entity_start_y < 0.0
            || self.entity_start_y > self.floor_y()
        {
            return Err(invalid("entity_start_y", "must lie between ceiling and floor"));
        }
        if !non_negative(self.gravity) {
            return Err(invalid("gravity", "must be finite and non-negative"));
        }
        if !self.flap_velocity.is_finite() || self.flap_velocity >= 0.0 {
            return Err(invalid("flap_velocity", "must be negative (upward)"));
        }
        if let Some(terminal) = self.terminal_velocity {
            if !positive(terminal) {
                return Err(invalid("terminal_velocity", "must be finite and positive"));
            }
        }
        if !non_negative(self.rotation_per_velocity)
            || !non_negative(self.max_up_angle)
            || !non_negative(self.max_down_angle)
        {
            return Err(invalid("rotation", "factor and angle caps must be non-negative"));
        }
        if !positive(self.obstacle_speed) {
            return Err(invalid("obstacle_speed", "must be finite and positive"));
        }
        if !positive(self.obstacle_width) {
            return Err(invalid("obstacle_width", "must be finite and positive"));
        }
        if !positive(self.gap_height) {
            return Err(invalid("gap_height", "must be finite and positive"));
        }
        if !non_negative(self.gap_margin) || self.gap_height + 2.0 * self.gap_margin > self.floor_y() {
            return Err(invalid("gap_margin", "gap plus margins must fit above the floor"));
        }
        if !positive(self.spawn_interval_ms) {
            return Err(invalid("spawn_interval_ms", "must be finite and positive"));
        }
        if self.pool_size == 0 {
            return Err(invalid("pool_size", "must be at least 1"));
        }
        Ok(())
    }
}
