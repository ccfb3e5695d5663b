//! Simulation tick and state machine
//!
//! External signals change phase; [`tick`] advances one step. The phase is
//! checked exactly once per tick, and while running the pipeline always
//! runs physics, then obstacles, then the judge.

use serde::{Deserialize, Serialize};

use super::collision::{CrashCause, check_obstacle_collision, check_world_bounds, update_scoring};
use super::state::{GameEvent, GamePhase, GameState};

/// External signals from the input collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    CharacterSelected,
    Start,
    Flap,
    Restart,
}

/// Apply a signal if it is valid in the current phase.
///
/// Returns false (and changes nothing) when the signal doesn't apply.
pub fn apply_signal(state: &mut GameState, signal: Signal) -> bool {
    match (state.phase, signal) {
        (GamePhase::Selecting, Signal::CharacterSelected) => {
            state.entity.reset(&state.config);
            state.set_phase(GamePhase::Ready);
            true
        }
        (GamePhase::Ready, Signal::Start) => {
            state.reset_run();
            state.set_phase(GamePhase::Running);
            // Initial flap so the entity doesn't drop straight away
            state.pending_flap = true;
            true
        }
        (GamePhase::Running, Signal::Flap) => {
            state.pending_flap = true;
            true
        }
        (GamePhase::GameOver, Signal::Restart) => {
            state.reset_run();
            state.set_phase(GamePhase::Ready);
            true
        }
        _ => false,
    }
}

/// End the current run. Only the first call per run has any effect.
pub fn end_run(state: &mut GameState, cause: CrashCause) -> bool {
    if state.phase != GamePhase::Running {
        return false;
    }

    state.pending_flap = false;
    state.events.push(GameEvent::Crashed { cause });
    state.set_phase(GamePhase::GameOver);

    let new_high_score = state.score > state.high_score;
    if new_high_score {
        state.high_score = state.score;
    }
    log::info!(
        "Run over ({:?}) with score {} (best {})",
        cause,
        state.score,
        state.high_score
    );
    state.events.push(GameEvent::GameOver {
        final_score: state.score,
        new_high_score,
    });
    true
}

/// Advance the simulation by one step of `dt` (in the configured time unit)
pub fn tick(state: &mut GameState, dt: f32) {
    let dt = crate::sanitize_dt(dt);

    match state.phase {
        GamePhase::Running => {}
        GamePhase::Ready => {
            state.entity.reset(&state.config);
            return;
        }
        GamePhase::Selecting | GamePhase::GameOver => return,
    }

    state.time_ticks += 1;

    // --- Physics ---
    let flap = std::mem::take(&mut state.pending_flap);
    if flap {
        state.events.push(GameEvent::Flapped);
    }
    state.entity.step(&state.config, flap, dt);

    // --- Obstacles ---
    state.pool.advance(state.config.obstacle_speed, dt);
    let events = &mut state.events;
    state
        .pool
        .retire_offscreen(|pair| events.push(GameEvent::Retired { pair }));

    let due = state.spawner.tick(
        state.config.time_unit.to_millis(dt),
        state.config.spawn_interval_ms as f64,
    );
    for _ in 0..due {
        match state.pool.spawn_pair(&state.config, &mut state.rng) {
            Some(pair) => state.events.push(GameEvent::Spawned { pair }),
            None => state.events.push(GameEvent::SpawnSkipped),
        }
    }

    // --- Judge ---
    judge(state);
}

/// Bounds, then obstacles in slot order. A pair hit by the entity and
/// every pair after it score nothing this tick; pairs ahead of it keep
/// their point.
fn judge(state: &mut GameState) {
    if let Some(cause) = check_world_bounds(&state.entity, &state.config) {
        end_run(state, cause);
        return;
    }

    let hit = check_obstacle_collision(&state.entity, state.pool.iter_active(), &state.config);
    let events = &mut state.events;
    update_scoring(
        &state.entity,
        state.pool.iter_active_mut().take(hit.unwrap_or(usize::MAX)),
        state.config.score_crossing,
        &mut state.score,
        |pair, score| {
            log::debug!("Cleared pair {}, score {}", pair.0, score);
            events.push(GameEvent::Scored { pair, score });
        },
    );

    if hit.is_some() {
        end_run(state, CrashCause::Obstacle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::consts::SIM_DT;
    use crate::sim::pool::PairHandle;
    use proptest::prelude::*;

    /// Running state with the initial flap cancelled and no gravity,
    /// so the entity hovers at its start point
    fn hovering(config: SimConfig) -> GameState {
        let mut state = GameState::new(
            SimConfig {
                gravity: 0.0,
                ..config
            },
            0,
        );
        apply_signal(&mut state, Signal::CharacterSelected);
        apply_signal(&mut state, Signal::Start);
        state.pending_flap = false;
        state.events.clear();
        state
    }

    fn place(state: &mut GameState, slot: usize, x: f32, gap_center_y: f32) {
        let handle = state.pool.acquire().unwrap();
        assert_eq!(handle, PairHandle(slot));
        let (gap, width) = (state.config.gap_height, state.config.obstacle_width);
        state
            .pool
            .get_mut(handle)
            .unwrap()
            .place(x, gap_center_y, gap, width);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut state = GameState::new(SimConfig::arcade(), 0);
        assert_eq!(state.phase, GamePhase::Selecting);

        // Signals out of phase are ignored
        assert!(!apply_signal(&mut state, Signal::Start));
        assert!(!apply_signal(&mut state, Signal::Flap));
        assert!(!apply_signal(&mut state, Signal::Restart));
        assert_eq!(state.phase, GamePhase::Selecting);

        assert!(apply_signal(&mut state, Signal::CharacterSelected));
        assert_eq!(state.phase, GamePhase::Ready);
        assert!(!apply_signal(&mut state, Signal::Flap));

        assert!(apply_signal(&mut state, Signal::Start));
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.pending_flap);

        tick(&mut state, SIM_DT);
        assert!(state.entity.velocity < 0.0);
        assert!(state.events.contains(&GameEvent::Flapped));

        assert!(end_run(&mut state, CrashCause::Obstacle));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(!apply_signal(&mut state, Signal::CharacterSelected));

        // Restart skips character selection
        assert!(apply_signal(&mut state, Signal::Restart));
        assert_eq!(state.phase, GamePhase::Ready);
    }

    #[test]
    fn test_ready_pins_entity_without_gravity() {
        let config = SimConfig::arcade();
        let mut state = GameState::new(config.clone(), 0);
        apply_signal(&mut state, Signal::CharacterSelected);
        state.entity.velocity = 300.0;
        for _ in 0..120 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.entity.pos.y, config.entity_start_y);
        assert_eq!(state.entity.velocity, 0.0);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_flap_then_integrate_scenario() {
        let config = SimConfig {
            world_height: 960.0,
            gravity: 1000.0,
            flap_velocity: -400.0,
            entity_start_y: 480.0,
            ..SimConfig::arcade()
        };
        let mut state = GameState::new(config, 0);
        apply_signal(&mut state, Signal::CharacterSelected);
        apply_signal(&mut state, Signal::Start);

        tick(&mut state, 0.1);
        assert!((state.entity.velocity - -300.0).abs() < 1e-3);
        assert!((state.entity.pos.y - 450.0).abs() < 1e-3);
    }

    #[test]
    fn test_three_spawns_in_4500ms() {
        let mut state = hovering(SimConfig {
            obstacle_speed: 1.0,
            ..SimConfig::arcade()
        });
        for _ in 0..540 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Running);
        let spawns = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::Spawned { .. }))
            .count();
        assert_eq!(spawns, 3);
        assert_eq!(state.pool.active_count(), 3);
    }

    #[test]
    fn test_pool_exhaustion_skips_spawn() {
        let mut state = hovering(SimConfig {
            obstacle_speed: 1.0,
            pool_size: 2,
            spawn_interval_ms: 100.0,
            ..SimConfig::arcade()
        });
        for _ in 0..3 {
            tick(&mut state, 0.1);
        }
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.pool.active_count(), 2);
        assert_eq!(state.pool.capacity(), 2);
        assert!(state.events.contains(&GameEvent::SpawnSkipped));
    }

    #[test]
    fn test_out_of_bounds_ends_run_same_tick() {
        let mut state = hovering(SimConfig::arcade());
        state.entity.velocity = 1.0e6;
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::Crashed {
            cause: CrashCause::Floor
        }));
        assert!(state.entity.pos.y <= state.config.world_height);

        let mut state = hovering(SimConfig::arcade());
        state.entity.velocity = -1.0e6;
        tick(&mut state, SIM_DT);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.events.contains(&GameEvent::Crashed {
            cause: CrashCause::Ceiling
        }));
        assert!(state.entity.pos.y >= 0.0);
    }

    #[test]
    fn test_score_stands_when_crash_follows_in_same_tick() {
        let mut state = hovering(SimConfig {
            spawn_interval_ms: 1.0e6,
            ..SimConfig::arcade()
        });
        // Slot 0 already passed, slot 1 overlaps the entity with its bottom half
        place(&mut state, 0, 0.0, 480.0);
        place(&mut state, 1, 100.0, 100.0);

        tick(&mut state, 0.001);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 1);
        assert_eq!(state.high_score, 1);
    }

    #[test]
    fn test_crash_short_circuits_later_pairs() {
        let mut state = hovering(SimConfig {
            spawn_interval_ms: 1.0e6,
            ..SimConfig::arcade()
        });
        // Slot 0 is lethal, slot 1 would score
        place(&mut state, 0, 100.0, 100.0);
        place(&mut state, 1, 0.0, 480.0);

        tick(&mut state, 0.001);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0);
        assert!(!state.pool.get(PairHandle(1)).unwrap().scored);
    }

    #[test]
    fn test_pair_scores_once_across_ticks() {
        let mut state = hovering(SimConfig {
            spawn_interval_ms: 1.0e6,
            ..SimConfig::arcade()
        });
        place(&mut state, 0, 0.0, 480.0);
        for _ in 0..20 {
            tick(&mut state, SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_score_events_carry_pair_and_total() {
        let mut state = hovering(SimConfig {
            spawn_interval_ms: 1.0e6,
            ..SimConfig::arcade()
        });
        place(&mut state, 0, 0.0, 480.0);
        place(&mut state, 1, -20.0, 480.0);

        tick(&mut state, SIM_DT);
        assert_eq!(
            state.events,
            vec![
                GameEvent::Scored {
                    pair: PairHandle(0),
                    score: 1
                },
                GameEvent::Scored {
                    pair: PairHandle(1),
                    score: 2
                },
            ]
        );
    }

    #[test]
    fn test_game_over_is_one_shot() {
        let mut state = hovering(SimConfig::arcade());
        state.score = 5;
        assert!(end_run(&mut state, CrashCause::Obstacle));
        assert!(!end_run(&mut state, CrashCause::Floor));

        let game_overs = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
        assert_eq!(state.high_score, 5);

        // Frozen: ticks change nothing
        let entity = state.entity.clone();
        tick(&mut state, 1.0);
        assert_eq!(state.entity, entity);
    }

    #[test]
    fn test_high_score_only_when_beaten() {
        let mut state = GameState::new(SimConfig::arcade(), 10);
        apply_signal(&mut state, Signal::CharacterSelected);
        apply_signal(&mut state, Signal::Start);
        state.score = 10;
        end_run(&mut state, CrashCause::Floor);
        assert_eq!(state.high_score, 10);
        assert!(state.events.contains(&GameEvent::GameOver {
            final_score: 10,
            new_high_score: false
        }));
    }

    #[test]
    fn test_restart_cycle_resets_score_and_pool() {
        let mut state = hovering(SimConfig {
            obstacle_speed: 1.0,
            spawn_interval_ms: 100.0,
            ..SimConfig::arcade()
        });
        for _ in 0..10 {
            tick(&mut state, 0.1);
        }
        state.score = 7;
        assert!(state.pool.active_count() > 0);
        end_run(&mut state, CrashCause::Obstacle);

        apply_signal(&mut state, Signal::Restart);
        apply_signal(&mut state, Signal::Start);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.pool.active_count(), 0);
        assert_eq!(state.spawner.since_last_ms(), 0.0);
        assert_eq!(state.entity.pos.y, state.config.entity_start_y);
    }

    #[test]
    fn test_determinism() {
        let config = SimConfig {
            seed: 99,
            gravity: 0.0,
            obstacle_speed: 1.0,
            spawn_interval_ms: 50.0,
            ..SimConfig::arcade()
        };
        let run = || {
            let mut state = hovering(config.clone());
            for _ in 0..60 {
                tick(&mut state, SIM_DT);
            }
            state
                .pool
                .iter_active()
                .map(|p| p.gap_center_y)
                .collect::<Vec<_>>()
        };
        let first = run();
        assert!(!first.is_empty());
        assert_eq!(first, run());
    }

    proptest! {
        #[test]
        fn prop_tick_scores_each_pair_at_most_once(
            pairs in proptest::collection::vec((-100.0f32..600.0, 200.0f32..700.0), 1..6),
            ticks in 1usize..400,
        ) {
            let mut state = hovering(SimConfig {
                spawn_interval_ms: 1.0e9,
                ..SimConfig::arcade()
            });
            for (slot, &(x, gap_center_y)) in pairs.iter().enumerate() {
                place(&mut state, slot, x, gap_center_y);
            }
            for _ in 0..ticks {
                tick(&mut state, SIM_DT);
            }

            let mut per_pair = vec![0u64; state.pool.capacity()];
            for event in &state.events {
                if let GameEvent::Scored { pair, .. } = event {
                    per_pair[pair.0] += 1;
                }
            }
            prop_assert!(per_pair.iter().all(|&n| n <= 1));
            prop_assert_eq!(state.score, per_pair.iter().sum::<u64>());
            prop_assert!(state.score <= pairs.len() as u64);
        }
    }
}
