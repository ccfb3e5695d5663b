//! The player-controlled entity
//!
//! Only `y` evolves; `x` is fixed for the lifetime of the run. Rotation is a
//! display hint recomputed from velocity every step, never integrated.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::config::{CeilingPolicy, SimConfig};
use crate::sanitize_dt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Center of the entity
    pub pos: Vec2,
    /// Vertical velocity (positive = down)
    pub velocity: f32,
    /// Display angle in radians (positive = nose down)
    pub rotation: f32,
    pub size: Vec2,
}

impl Entity {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            pos: Vec2::new(config.entity_x, config.entity_start_y),
            velocity: 0.0,
            rotation: 0.0,
            size: Vec2::new(config.entity_width, config.entity_height),
        }
    }

    /// Pin to the start point with no motion (ready phase / reset)
    pub fn reset(&mut self, config: &SimConfig) {
        *self = Self::new(config);
    }

    /// Overwrite velocity with the flap velocity. Flaps never stack.
    pub fn flap(&mut self, config: &SimConfig) {
        self.velocity = config.flap_velocity;
    }

    /// Accelerate downward, respecting the terminal velocity if configured
    pub fn apply_gravity(&mut self, config: &SimConfig, dt: f32) {
        let dt = sanitize_dt(dt);
        self.velocity += config.gravity * dt;
        if let Some(terminal) = config.terminal_velocity {
            self.velocity = self.velocity.min(terminal);
        }
    }

    /// Move by the current velocity and keep the center inside the world
    pub fn integrate(&mut self, config: &SimConfig, dt: f32) {
        let dt = sanitize_dt(dt);
        let y = self.pos.y + self.velocity * dt;
        self.pos.y = if y.is_finite() {
            y.clamp(0.0, config.world_height)
        } else {
            config.world_height
        };

        if config.ceiling == CeilingPolicy::Clamp {
            let half_h = self.size.y / 2.0;
            if self.pos.y - half_h < 0.0 {
                self.pos.y = half_h;
                self.velocity = 0.0;
            }
        }
    }

    /// Recompute the display angle from velocity alone
    pub fn update_rotation(&mut self, config: &SimConfig) {
        self.rotation = (self.velocity * config.rotation_per_velocity)
            .clamp(-config.max_up_angle, config.max_down_angle);
    }

    /// One physics step: optional flap, gravity, integration, rotation
    pub fn step(&mut self, config: &SimConfig, flap: bool, dt: f32) {
        if flap {
            self.flap(config);
        }
        self.apply_gravity(config, dt);
        self.integrate(config, dt);
        self.update_rotation(config);
    }

    /// Full visual bounds (used for world bounds)
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size / 2.0)
    }

    /// Collision box against obstacles, shrunk by the hitbox inset
    pub fn hitbox(&self, config: &SimConfig) -> Aabb {
        let half = (self.size / 2.0 - Vec2::splat(config.hitbox_inset)).max(Vec2::ZERO);
        Aabb::from_center(self.pos, half)
    }
}
