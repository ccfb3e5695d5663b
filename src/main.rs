//! Flap Core headless host
//!
//! Drives the simulation at 60 frames per second with a simple autopilot and
//! logs what happens. Usage:
//!
//! ```text
//! flap-core [config.json] [highscore.json]
//! ```

use flap_core::sim::{GameEvent, GamePhase};
use flap_core::{JsonFileStore, MemoryStore, ScoreStore, SimConfig, Simulation, Snapshot, StepMode};

/// Frames simulated per run before giving up
const MAX_FRAMES_PER_RUN: u32 = 60 * 120;
/// Runs played before exiting
const RUNS: u32 = 3;
const FRAME_SECS: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    log::info!("Flap Core (native) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };
    let store: Box<dyn ScoreStore> = match args.next() {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::default()),
    };

    let mut sim = match Simulation::new(config, StepMode::default(), store) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    sim.set_on_game_over(|score| log::info!("Submitting final score {}", score));

    sim.on_character_selected();
    for run in 1..=RUNS {
        if run > 1 {
            sim.on_restart_signal();
            sim.frame(FRAME_SECS);
        }
        sim.on_start_signal();

        let mut frames = 0;
        while sim.phase() != GamePhase::GameOver && frames < MAX_FRAMES_PER_RUN {
            let state = sim.state();
            if should_flap(&sim.snapshot(), state.entity.velocity, state.config.floor_y()) {
                sim.on_flap_signal();
            }
            for event in sim.frame(FRAME_SECS) {
                match event {
                    GameEvent::Scored { score, .. } => log::debug!("Score {}", score),
                    GameEvent::SpawnSkipped => log::warn!("Spawn skipped: pool exhausted"),
                    GameEvent::Crashed { cause } => log::info!("Crashed into {:?}", cause),
                    _ => {}
                }
            }
            frames += 1;
        }

        let snapshot = sim.snapshot();
        log::info!(
            "Run {} finished after {:.1}s: score {}, best {}",
            run,
            frames as f32 * FRAME_SECS,
            snapshot.score,
            snapshot.high_score
        );
    }

    sim.halt();
}

/// Flap when falling below the middle of the next gap
fn should_flap(snapshot: &Snapshot, velocity: f32, floor_y: f32) -> bool {
    if snapshot.phase != GamePhase::Running || velocity < 0.0 {
        return false;
    }
    let entity = snapshot.entity_position;
    let target = snapshot
        .active_obstacles
        .iter()
        .filter(|o| o.x + o.width >= entity.x)
        .min_by(|a, b| a.x.total_cmp(&b.x))
        .map(|o| (o.gap_top + o.gap_bottom) / 2.0 + (o.gap_bottom - o.gap_top) * 0.15)
        .unwrap_or(floor_y / 2.0);
    entity.y > target
}
