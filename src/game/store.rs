use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::GameSession;

/// Opaque identifier handed to the caller when a game starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("game-{id:06}"))
}

/// Session persistence seam so the service can be exercised in isolation.
pub trait SessionStore: Send + Sync {
    fn create(&self, session: GameSession) -> Result<SessionId, StoreError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<GameSession>, StoreError>;
    fn update(&self, id: &SessionId, session: GameSession) -> Result<(), StoreError>;
    fn delete(&self, id: &SessionId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, GameSession>>>,
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, session: GameSession) -> Result<SessionId, StoreError> {
        let id = next_session_id();
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.insert(id.clone(), session);
        Ok(id)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<GameSession>, StoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, id: &SessionId, session: GameSession) -> Result<(), StoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(id) {
            guard.insert(id.clone(), session);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

/// One qualifying finish, appended when a run completes above threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub username: String,
    pub religion: String,
    pub score: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only scoreboard seam.
pub trait Scoreboard: Send + Sync {
    fn append(&self, entry: ScoreboardEntry) -> Result<(), ScoreboardError>;
    fn entries(&self) -> Result<Vec<ScoreboardEntry>, ScoreboardError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScoreboardError {
    #[error("scoreboard io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("scoreboard encoding failed: {0}")]
    Encoding(#[from] csv::Error),
}

#[derive(Default, Clone)]
pub struct InMemoryScoreboard {
    entries: Arc<Mutex<Vec<ScoreboardEntry>>>,
}

impl Scoreboard for InMemoryScoreboard {
    fn append(&self, entry: ScoreboardEntry) -> Result<(), ScoreboardError> {
        let mut guard = self.entries.lock().expect("scoreboard mutex poisoned");
        guard.push(entry);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<ScoreboardEntry>, ScoreboardError> {
        let guard = self.entries.lock().expect("scoreboard mutex poisoned");
        Ok(guard.clone())
    }
}

/// CSV-file scoreboard; one row per qualifying finish, header written once.
pub struct CsvScoreboard {
    path: PathBuf,
}

impl CsvScoreboard {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Scoreboard for CsvScoreboard {
    fn append(&self, entry: ScoreboardEntry) -> Result<(), ScoreboardError> {
        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<ScoreboardEntry>, ScoreboardError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for record in reader.deserialize::<ScoreboardEntry>() {
            entries.push(record?);
        }
        Ok(entries)
    }
}
