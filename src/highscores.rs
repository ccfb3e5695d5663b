//! High score persistence
//!
//! The simulation only needs one number: the best score so far. It is read
//! once when the simulation is built and written when a run beats it.
//! Stores are collaborators; a failed write never affects gameplay.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("high score file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store for the persisted high score
pub trait ScoreStore {
    /// Best score on record (0 if none)
    fn load_high_score(&self) -> u64;

    /// Persist a new best score
    fn save_high_score(&mut self, score: u64) -> Result<(), StoreError>;
}

/// In-memory store (tests, hosts without persistence)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    high_score: u64,
}

impl MemoryStore {
    pub fn new(high_score: u64) -> Self {
        Self { high_score }
    }
}

impl ScoreStore for MemoryStore {
    fn load_high_score(&self) -> u64 {
        self.high_score
    }

    fn save_high_score(&mut self, score: u64) -> Result<(), StoreError> {
        self.high_score = score;
        Ok(())
    }
}

/// On-disk record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u64,
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<HighScoreRecord, StoreError> {
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl ScoreStore for JsonFileStore {
    fn load_high_score(&self) -> u64 {
        match self.read() {
            Ok(record) => {
                log::info!("Loaded high score {}", record.high_score);
                record.high_score
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high score found, starting fresh");
                0
            }
            Err(e) => {
                log::warn!("Ignoring unreadable high score at {:?}: {}", self.path, e);
                0
            }
        }
    }

    fn save_high_score(&mut self, score: u64) -> Result<(), StoreError> {
        let json = serde_json::to_string(&HighScoreRecord { high_score: score })?;
        std::fs::write(&self.path, json)?;
        log::info!("High score {} saved", score);
        Ok(())
    }
}
