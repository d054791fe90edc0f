//! ==============================================================================
//! persistence.rs - durable snapshot of the application state
//! ==============================================================================
//!
//! purpose:
//!     keeps the latest state in a single string-keyed slot so a restart
//!     picks up the history where it left off.
//!     - save: after every successful store update, overwrite the slot
//!     - load: once at startup; anything unreadable means "start empty"
//!
//! relationships:
//!     - used by: main.rs (load at startup), poller.rs (save after apply)
//!     - produces/consumes: domain::ApplicationState as json
//!
//! ==============================================================================

use crate::domain::ApplicationState;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage slot poisoned")]
    Poisoned,
}

/// a string-keyed slot store, the local equivalent of browser key-value storage
pub trait StateStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

// ==============================================================================
// file storage - one json file per key
// ==============================================================================

pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;

        // write aside, then rename over the slot: readers never see half a file
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &target)?;
        Ok(())
    }
}

// ==============================================================================
// memory storage - ephemeral runs and tests
// ==============================================================================

#[derive(Default, Clone)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let slots = self.slots.lock().map_err(|_| PersistenceError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut slots = self.slots.lock().map_err(|_| PersistenceError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ==============================================================================
// state persistence - save/load of the whole application state
// ==============================================================================

#[derive(Clone)]
pub struct StatePersistence {
    storage: Arc<dyn StateStorage>,
    key: String,
}

impl StatePersistence {
    pub fn new(storage: Arc<dyn StateStorage>, key: impl Into<String>) -> Self {
        Self { storage, key: key.into() }
    }

    /// serialize the full state and overwrite the slot
    pub fn save(&self, state: &ApplicationState) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(state)?;
        self.storage.write(&self.key, &json)
    }

    /// rehydrate the saved state, or `None` if there is nothing usable
    pub fn try_load(&self) -> Option<ApplicationState> {
        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!("[STORAGE] No saved state under '{}'", self.key);
                return None;
            }
            Err(e) => {
                tracing::warn!("[STORAGE] ⚠ Could not read saved state: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ApplicationState>(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("[STORAGE] ⚠ Ignoring corrupt saved state: {}", e);
                None
            }
        }
    }

    /// load for startup: corrupt or missing data yields the initial state
    pub fn load(&self, capacity: usize) -> ApplicationState {
        match self.try_load() {
            Some(mut state) => {
                state.set_capacity(capacity);
                state.loading = true;
                tracing::info!(
                    "[STORAGE] ✓ Restored {} temperature points (last updated {})",
                    state.temperature.len(),
                    if state.last_updated.is_empty() { "never" } else { &state.last_updated }
                );
                state
            }
            None => ApplicationState::initial(capacity),
        }
    }
}
