//! Frame clock
//!
//! Turns frame callbacks into simulation steps, either one variable step per
//! frame or a fixed-rate accumulator. Output `dt` is always in seconds, finite
//! and non-negative; unit conversion happens in the caller.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::sanitize_dt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepMode {
    /// One step per frame using the real elapsed time, capped at `max_dt`
    Variable { max_dt: f32 },
    /// Steps of exactly `step` seconds; at most `max_substeps` per frame
    Fixed { step: f32, max_substeps: u32 },
}

impl Default for StepMode {
    fn default() -> Self {
        StepMode::Fixed {
            step: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl StepMode {
    pub fn variable() -> Self {
        StepMode::Variable {
            max_dt: MAX_FRAME_DT,
        }
    }
}

/// What to run for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepPlan {
    /// Number of simulation steps to run
    pub steps: u32,
    /// Length of each step in seconds
    pub dt: f32,
    /// Backlog discarded to avoid a spiral of death (seconds)
    pub dropped: f32,
}

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    mode: StepMode,
    accumulator: f32,
    last_timestamp_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(mode: StepMode) -> Self {
        Self {
            mode,
            accumulator: 0.0,
            last_timestamp_ms: None,
        }
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// Time carried toward the next fixed step
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Forget carried time and the last timestamp. Idempotent.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_timestamp_ms = None;
    }

    /// Drop carried time but keep the timestamp baseline
    pub fn reset_accumulator(&mut self) {
        self.accumulator = 0.0;
    }

    /// Plan the steps for a frame that took `elapsed` seconds
    pub fn advance(&mut self, elapsed: f32) -> StepPlan {
        let elapsed = sanitize_dt(elapsed);
        match self.mode {
            StepMode::Variable { max_dt } => StepPlan {
                steps: 1,
                dt: elapsed.min(max_dt),
                dropped: (elapsed - max_dt).max(0.0),
            },
            StepMode::Fixed { step, max_substeps } => {
                if step <= 0.0 || !step.is_finite() {
                    return StepPlan::default();
                }
                self.accumulator += elapsed;

                let mut steps = 0;
                while self.accumulator >= step && steps < max_substeps {
                    self.accumulator -= step;
                    steps += 1;
                }

                let mut dropped = 0.0;
                if self.accumulator >= step {
                    dropped = self.accumulator;
                    self.accumulator = 0.0;
                    log::debug!("Dropped {:.3}s of simulation backlog", dropped);
                }

                StepPlan {
                    steps,
                    dt: step,
                    dropped,
                }
            }
        }
    }

    /// Plan the steps for a frame callback at an absolute timestamp (ms).
    ///
    /// The first callback after construction or reset yields no elapsed time.
    pub fn advance_to(&mut self, timestamp_ms: f64) -> StepPlan {
        if !timestamp_ms.is_finite() {
            return self.advance(0.0);
        }
        let elapsed = self
            .last_timestamp_ms
            .map(|last| ((timestamp_ms - last) / 1000.0) as f32)
            .unwrap_or(0.0);
        self.last_timestamp_ms = Some(timestamp_ms);
        self.advance(elapsed)
    }
}
