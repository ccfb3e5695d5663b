//! Host-facing simulation
//!
//! Hosts own a [`Simulation`], forward input as signals, call [`Simulation::frame`]
//! once per frame callback and render from [`Simulation::snapshot`]. Signals
//! received between frames are queued and applied at the top of the next
//! frame, so no step ever sees a half-applied transition.

use std::collections::VecDeque;

use glam::Vec2;
use serde::Serialize;

use crate::clock::{FrameClock, StepMode};
use crate::config::{ConfigError, SimConfig};
use crate::highscores::{MemoryStore, ScoreStore};
use crate::sim::{GameEvent, GamePhase, GameState, Signal, apply_signal, tick};

/// Renderer-facing view of one obstacle pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObstacleView {
    pub x: f32,
    pub width: f32,
    pub gap_top: f32,
    pub gap_bottom: f32,
}

/// Read-only view of the simulation for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub entity_visible: bool,
    pub entity_position: Vec2,
    pub entity_rotation: f32,
    pub active_obstacles: Vec<ObstacleView>,
    pub score: u64,
    pub high_score: u64,
}

type GameOverCallback = Box<dyn FnMut(u64)>;

pub struct Simulation {
    state: GameState,
    clock: FrameClock,
    signals: VecDeque<Signal>,
    store: Box<dyn ScoreStore>,
    on_game_over: Option<GameOverCallback>,
    halted: bool,
}

impl Simulation {
    /// Build a simulation, reading the persisted high score from `store`.
    ///
    /// Fails if `config` does not validate; nothing past this point can fail.
    pub fn new(
        config: SimConfig,
        mode: StepMode,
        store: Box<dyn ScoreStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let high_score = store.load_high_score();
        log::info!(
            "Simulation ready (seed {}, pool {}, best {})",
            config.seed,
            config.pool_size,
            high_score
        );
        Ok(Self {
            state: GameState::new(config, high_score),
            clock: FrameClock::new(mode),
            signals: VecDeque::new(),
            store,
            on_game_over: None,
            halted: false,
        })
    }

    /// Simulation with an in-memory high score store
    pub fn in_memory(config: SimConfig, mode: StepMode) -> Result<Self, ConfigError> {
        Self::new(config, mode, Box::new(MemoryStore::default()))
    }

    /// Register the callback fired once per game over with the final score
    pub fn set_on_game_over(&mut self, callback: impl FnMut(u64) + 'static) {
        self.on_game_over = Some(Box::new(callback));
    }

    // === Input entry points (applied at the start of the next frame) ===

    pub fn on_character_selected(&mut self) {
        self.signals.push_back(Signal::CharacterSelected);
    }

    pub fn on_start_signal(&mut self) {
        self.signals.push_back(Signal::Start);
    }

    pub fn on_flap_signal(&mut self) {
        self.signals.push_back(Signal::Flap);
    }

    pub fn on_restart_signal(&mut self) {
        self.signals.push_back(Signal::Restart);
    }

    /// Process one frame that took `elapsed_secs` of wall time.
    ///
    /// Returns the events produced during the frame.
    pub fn frame(&mut self, elapsed_secs: f32) -> Vec<GameEvent> {
        if self.halted {
            return Vec::new();
        }
        self.apply_queued_signals();

        let plan = self.clock.advance(elapsed_secs);
        self.run_steps(plan.steps, plan.dt)
    }

    /// Process one frame callback carrying an absolute timestamp (ms)
    pub fn frame_at(&mut self, timestamp_ms: f64) -> Vec<GameEvent> {
        if self.halted {
            return Vec::new();
        }
        self.apply_queued_signals();

        let plan = self.clock.advance_to(timestamp_ms);
        self.run_steps(plan.steps, plan.dt)
    }

    /// Stop processing frames for good. Returns false if already halted.
    pub fn halt(&mut self) -> bool {
        if self.halted {
            return false;
        }
        self.halted = true;
        self.signals.clear();
        self.clock.reset();
        log::info!("Simulation halted");
        true
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Read-only access to the full state
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        Snapshot {
            phase: state.phase,
            entity_visible: state.phase != GamePhase::Selecting,
            entity_position: state.entity.pos,
            entity_rotation: state.entity.rotation,
            active_obstacles: state
                .pool
                .iter_active()
                .map(|pair| ObstacleView {
                    x: pair.x,
                    width: pair.width,
                    gap_top: pair.gap_top(),
                    gap_bottom: pair.gap_bottom(),
                })
                .collect(),
            score: state.score,
            high_score: state.high_score,
        }
    }

    fn apply_queued_signals(&mut self) {
        let phase = self.state.phase;
        while let Some(signal) = self.signals.pop_front() {
            if !apply_signal(&mut self.state, signal) {
                log::trace!("Ignored {:?} during {:?}", signal, self.state.phase);
            }
        }
        // Time carried over from the previous phase must not leak into the new one
        if self.state.phase != phase {
            self.clock.reset_accumulator();
        }
    }

    fn run_steps(&mut self, steps: u32, dt_secs: f32) -> Vec<GameEvent> {
        let dt = self.state.config.time_unit.from_seconds(dt_secs);
        for _ in 0..steps {
            tick(&mut self.state, dt);
            if self.state.phase == GamePhase::GameOver {
                break;
            }
        }

        let events = self.state.drain_events();
        for event in &events {
            if let GameEvent::GameOver {
                final_score,
                new_high_score,
            } = *event
            {
                self.clock.reset_accumulator();
                self.finish_run(final_score, new_high_score);
            }
        }
        events
    }

    fn finish_run(&mut self, final_score: u64, new_high_score: bool) {
        if new_high_score {
            if let Err(e) = self.store.save_high_score(final_score) {
                log::warn!("Failed to save high score {}: {}", final_score, e);
            }
        }
        if let Some(callback) = self.on_game_over.as_mut() {
            callback(final_score);
        }
    }
}
