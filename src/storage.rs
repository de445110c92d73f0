//! Persisted client state
//!
//! View mode, time filter and custom range bounds survive reloads under fixed keys.
//! Storage failures are logged and never interrupt rendering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;

/// Active view (`graph`, `grid`, `radial`, `time`)
pub const VIEW_MODE_KEY: &str = "dm-graph-view";
/// Time filter preset (`week`, `month`, `year`, `all`, `custom`)
pub const TIME_FILTER_KEY: &str = "dm-time-filter";
/// Custom range start date (`YYYY-MM-DD`)
pub const TIME_FROM_KEY: &str = "dm-time-from";
/// Custom range end date (`YYYY-MM-DD`)
pub const TIME_TO_KEY: &str = "dm-time-to";

/// Client-local key/value persistence
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-process storage; forgets everything when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Storage backed by a single JSON object on disk, rewritten on every change
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStorage {
    /// Open the file, starting empty when it is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed state file");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, values }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn flush_logged(&self) {
        if let Err(e) = self.flush() {
            warn!(path = %self.path.display(), error = %e, "failed to persist client state");
        }
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.flush_logged();
    }

    fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.flush_logged();
        }
    }
}
