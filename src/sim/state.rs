//! Game state and core simulation types
//!
//! [`GameState`] is the single context object every simulation step works on.
//! It is owned by the host (through `Simulation`) and nothing in it refers to
//! anything outside itself.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::CrashCause;
use super::entity::Entity;
use super::pool::{ObstaclePool, PairHandle, Spawner};
use crate::config::SimConfig;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Choosing a character; entity hidden and inert
    #[default]
    Selecting,
    /// Entity pinned at the start point, gravity off
    Ready,
    /// Active gameplay
    Running,
    /// Run ended; everything frozen until restart
    GameOver,
}

/// Things that happened during a tick, for audio/particle/render collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    Flapped,
    Spawned { pair: PairHandle },
    /// Spawn fell due while every pool slot was active
    SpawnSkipped,
    Retired { pair: PairHandle },
    Scored { pair: PairHandle, score: u64 },
    Crashed { cause: CrashCause },
    GameOver { final_score: u64, new_high_score: bool },
}

/// Complete simulation state (deterministic for a given config, seed and input)
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: SimConfig,
    pub phase: GamePhase,
    pub score: u64,
    pub high_score: u64,
    pub entity: Entity,
    pub pool: ObstaclePool,
    pub spawner: Spawner,
    /// Flap requested for the next running tick
    pub pending_flap: bool,
    /// Simulation tick counter (running ticks only)
    pub time_ticks: u64,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create a new state in the selecting phase
    pub fn new(config: SimConfig, high_score: u64) -> Self {
        let rng = Pcg32::seed_from_u64(config.seed);
        Self {
            phase: GamePhase::Selecting,
            score: 0,
            high_score,
            entity: Entity::new(&config),
            pool: ObstaclePool::new(config.pool_size),
            spawner: Spawner::new(),
            pending_flap: false,
            time_ticks: 0,
            events: Vec::new(),
            rng,
            config,
        }
    }

    /// Put entity, pool and spawn timer back to their start-of-run values
    pub fn reset_run(&mut self) {
        self.score = 0;
        self.entity.reset(&self.config);
        self.pool.release_all();
        self.spawner.reset();
        self.pending_flap = false;
        self.time_ticks = 0;
    }

    /// Change phase and record the transition
    pub(crate) fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        log::info!("Phase {:?} -> {:?}", from, to);
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
