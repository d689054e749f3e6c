//! Key-value persistence seam
//!
//! The store only ever needs `get(key)` and `set(key, value)`. Userscript
//! storage, a JSON file and an in-memory map all fit behind [`KvStore`].

use std::collections::HashMap;

/// Error type for persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to encode document: {0}")]
    Encode(#[from] super::format::FormatError),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Minimal string key-value store.
pub trait KvStore {
    /// Raw stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Overwrite the value stored under `key`.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Process-local store backed by a hashmap.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
