//! File-backed storage backend.
//!
//! Persists the whole key-value map as one JSON document, rewritten on
//! every mutation. The map is small (a handful of fixed keys) so the
//! rewrite cost is irrelevant next to the durability it buys.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

use super::Storage;

/// Durable storage persisted to a JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) the store at `path`.
    ///
    /// A missing file starts empty; a corrupt file is logged and also
    /// starts empty rather than failing the whole client.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures other than the file not
    /// existing.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();

        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), %error, "resetting corrupt local store");
                HashMap::new()
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => return Err(error),
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn persist(&self, values: &HashMap<String, String>) {
        let result = serde_json::to_string_pretty(values)
            .map_err(io::Error::other)
            .and_then(|raw| std::fs::write(&self.path, raw));

        if let Err(error) = result {
            tracing::warn!(path = %self.path.display(), %error, "failed to persist local store");
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self
            .values
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}
