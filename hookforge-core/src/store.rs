// Copyright 2025 Hookforge (https://github.com/hookforge)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Version store: the persistence collaborator for plugin records.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a version store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Persistence collaborator contract used by the lifecycle manager.
///
/// The engine consumes this purely as a key/value lookup from plugin
/// identifier to installed version. Reconciliation after a crash between
/// dispatch and persistence (replaying an install) is the store owner's
/// concern; subscribers must tolerate re-delivery.
pub trait VersionStore: Send + Sync {
    /// Get the installed version for an identifier, if any.
    fn get(&self, identifier: &str) -> Result<Option<String>, StoreError>;

    /// Record the installed version for an identifier.
    fn put(&self, identifier: &str, version: &str) -> Result<(), StoreError>;

    /// Delete the record for an identifier. Deleting an absent record is not
    /// an error.
    fn delete(&self, identifier: &str) -> Result<(), StoreError>;
}

/// In-memory version store for tests and embedded hosts.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    records: RwLock<HashMap<String, String>>,
}

impl InMemoryVersionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records, sorted by identifier.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .records
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }
}

impl VersionStore for InMemoryVersionStore {
    fn get(&self, identifier: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.read().get(identifier).cloned())
    }

    fn put(&self, identifier: &str, version: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .insert(identifier.to_string(), version.to_string());
        Ok(())
    }

    fn delete(&self, identifier: &str) -> Result<(), StoreError> {
        self.records.write().remove(identifier);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    installed: HashMap<String, String>,
}

/// File-backed version store.
///
/// The whole record map is written through on every mutation; a missing file
/// loads as empty.
#[derive(Debug)]
pub struct JsonVersionStore {
    path: PathBuf,
    records: RwLock<HashMap<String, String>>,
}

impl JsonVersionStore {
    /// Open a store at the given path, creating an empty one if the file
    /// does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&content)?;
            file.installed
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of all records, sorted by identifier.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .records
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    fn save(&self, records: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = StoreFile {
            installed: records.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl VersionStore for JsonVersionStore {
    fn get(&self, identifier: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.read().get(identifier).cloned())
    }

    fn put(&self, identifier: &str, version: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        records.insert(identifier.to_string(), version.to_string());
        self.save(&records)
    }

    fn delete(&self, identifier: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        records.remove(identifier);
        self.save(&records)
    }
}
