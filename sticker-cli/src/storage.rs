//! Client storage kept in a JSON file between runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sticker_core::{ClientStorage, CoreError, CoreResult};

/// [`ClientStorage`] backed by a flat JSON object on disk.
///
/// A missing or unreadable file reads as empty.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Store values in `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "Ignoring malformed state file: {e}");
            BTreeMap::new()
        })
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut values = self.read_all();
        values.insert(key.to_string(), value.to_string());
        let raw = serde_json::to_string_pretty(&values)?;
        std::fs::write(&self.path, raw).map_err(|e| {
            CoreError::Collaborator(format!("writing {}: {e}", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("state.json"));
        assert_eq!(storage.get("anonymous_id"), None);
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        FileStorage::new(&path).set("anonymous_id", "abc").expect("set");
        FileStorage::new(&path).set("other", "1").expect("set");

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("anonymous_id").as_deref(), Some("abc"));
        assert_eq!(reopened.get("other").as_deref(), Some("1"));
    }

    #[test]
    fn malformed_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").expect("write");
        assert_eq!(FileStorage::new(&path).get("anonymous_id"), None);
    }
}
