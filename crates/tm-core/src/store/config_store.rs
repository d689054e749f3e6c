//! Config store: sole owner of the persisted configuration document

use std::sync::{Mutex, MutexGuard};

use super::backend::{KvStore, StoreError};
use super::format::{decode_document, encode_document};
use crate::types::ConfigDocument;

/// Key the document is stored under.
pub const STORAGE_KEY: &str = "empornium-threadman-options";

/// Loads and saves the configuration document through a key-value backend.
///
/// Every write replaces the whole document. The backend sits behind one lock,
/// so concurrent callers get last-writer-wins and [`ConfigStore::update`] is an
/// atomic read-modify-write.
pub struct ConfigStore<S> {
    backend: Mutex<S>,
}

impl<S: KvStore> ConfigStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    pub fn into_inner(self) -> S {
        self.backend.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load the document. Missing or corrupt state yields an empty document.
    pub fn load(&self) -> ConfigDocument {
        load_from(&*self.lock())
    }

    /// Serialize `doc` and overwrite the stored value.
    pub fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        save_to(&mut *self.lock(), doc)
    }

    /// Load, apply `f`, and save, all under the store lock.
    pub fn update<T>(&self, f: impl FnOnce(&mut ConfigDocument) -> T) -> Result<T, StoreError> {
        let mut backend = self.lock();
        let mut doc = load_from(&*backend);
        let out = f(&mut doc);
        save_to(&mut *backend, &doc)?;
        Ok(out)
    }

    /// Overwrite the stored document with an empty one.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.save(&ConfigDocument::default())
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // A panic mid-write leaves at worst a stale document, never a torn one.
        self.backend.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_from<S: KvStore>(backend: &S) -> ConfigDocument {
    let Some(raw) = backend.get(STORAGE_KEY) else {
        return ConfigDocument::default();
    };
    match decode_document(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("Discarding unreadable stored options: {}", e);
            ConfigDocument::default()
        }
    }
}

fn save_to<S: KvStore>(backend: &mut S, doc: &ConfigDocument) -> Result<(), StoreError> {
    let raw = encode_document(doc)?;
    log::info!(
        "Saving options to {}: {} allowed, {} blocked, {} viewed",
        STORAGE_KEY,
        doc.allowed.len(),
        doc.blocked.len(),
        doc.viewed.len()
    );
    backend.set(STORAGE_KEY, raw)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_load_without_state_is_empty() {
        let store = ConfigStore::new(MemoryStore::new());
        assert_eq!(store.load(), ConfigDocument::default());
    }

    #[test]
    fn test_load_corrupt_state_is_empty() {
        let mut backend = MemoryStore::new();
        backend.set(STORAGE_KEY, "{\"options\":".to_string()).unwrap();
        let store = ConfigStore::new(backend);
        assert_eq!(store.load(), ConfigDocument::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = ConfigStore::new(MemoryStore::new());
        let mut doc = ConfigDocument::new();
        doc.blocked.insert("42".into());
        doc.allowed.insert("43".into());
        doc.viewed.record("44".into(), Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());

        store.save(&doc).expect("save");
        assert_eq!(store.load(), doc);
    }

    #[test]
    fn test_save_overwrites_whole_document() {
        let store = ConfigStore::new(MemoryStore::new());
        let mut first = ConfigDocument::new();
        first.blocked.insert("1".into());
        first.allowed.insert("2".into());
        store.save(&first).expect("save");

        let mut second = ConfigDocument::new();
        second.blocked.insert("3".into());
        store.save(&second).expect("save");

        assert_eq!(store.load(), second);
    }

    #[test]
    fn test_update_persists_mutation() {
        let store = ConfigStore::new(MemoryStore::new());
        let inserted = store
            .update(|doc| doc.blocked.insert("9".into()))
            .expect("update");
        assert!(inserted);

        let backend = store.into_inner();
        let raw = backend.get(STORAGE_KEY).expect("stored value");
        assert!(raw.contains("blacklist"));
        assert!(raw.contains(r#"[\"9\"]"#));
    }

    #[test]
    fn test_reset_clears_document() {
        let store = ConfigStore::new(MemoryStore::new());
        store.update(|doc| doc.allowed.insert("1".into())).expect("update");
        store.reset().expect("reset");
        assert_eq!(store.load(), ConfigDocument::default());
    }

    #[test]
    fn test_update_over_legacy_state_keeps_lists() {
        let mut backend = MemoryStore::new();
        let legacy = r#"{"options":{"whitelist":{"threads":"[]"},"blacklist":{"threads":"[\"12\",\"9\"]"}},"userSelected":{"threads":"[{\"id\":\"5\",\"lastClicked\":\"2024-01-10\"}]"}}"#;
        backend.set(STORAGE_KEY, legacy.to_string()).unwrap();
        let store = ConfigStore::new(backend);

        store.update(|doc| doc.blocked.insert("77".into())).expect("update");

        let doc = store.load();
        assert_eq!(doc.blocked.len(), 3);
        assert!(doc.blocked.contains(&"12".into()));
        assert_eq!(
            doc.viewed.get(&"5".into()),
            Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap())
        );
    }
}
