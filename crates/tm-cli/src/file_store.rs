use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tm_core::{KvStore, StoreError};

/// Key-value backend persisted as one JSON object in a file.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: &Path) -> Self {
        let values = match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable store '{}': {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    /// `<data dir>/threadman/store.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("threadman").join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `values` to disk, replacing the file in one rename.
    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
        let text = serde_json::to_string_pretty(values)
            .map_err(|e| format!("Failed to encode store: {}", e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| format!("Failed to write '{}': {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| format!("Failed to replace '{}': {}", self.path.display(), e))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        // Memory only changes once the file does.
        let mut values = self.values.clone();
        values.insert(key.to_string(), value);
        self.flush(&values).map_err(StoreError::Backend)?;
        self.values = values;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tm_core::{ConfigStore, STORAGE_KEY};

    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(&dir.path().join("store.json"));
        assert_eq!(store.get(STORAGE_KEY), None);
    }

    #[test]
    fn test_set_persists_across_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path);
        store.set("k", "v".to_string()).expect("set");

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("k"), Some("v".to_string()));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        let mut store = FileStore::open(&path);
        store.set("k", "old".to_string()).expect("set");

        // A directory in the temp file's place makes the write fail.
        fs::create_dir(path.with_extension("json.tmp")).expect("mkdir");
        assert!(matches!(store.set("k", "new".to_string()), Err(StoreError::Backend(_))));

        assert_eq!(store.get("k"), Some("old".to_string()));
        assert_eq!(FileStore::open(&path).get("k"), Some("old".to_string()));
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").expect("write");

        let store = ConfigStore::new(FileStore::open(&path));
        assert_eq!(store.load(), Default::default());
    }

    #[test]
    fn test_config_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        let store = ConfigStore::new(FileStore::open(&path));
        store.mark_blocked("42".into()).expect("block");

        let reopened = ConfigStore::new(FileStore::open(&path));
        assert!(reopened.load().blocked.contains(&"42".into()));
    }
}
