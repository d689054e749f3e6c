//! User actions on a thread
//!
//! The three mutations the content script offers: block, allow and mark
//! viewed. Each has a pure form over a [`ConfigDocument`] and a persisted form
//! that runs as one read-modify-write on the [`ConfigStore`]. None of them
//! decides visibility; that stays with the visibility engine.

use crate::store::{ConfigStore, KvStore, StoreError};
use crate::types::{ConfigDocument, ThreadId, Timestamp};

/// A mutation triggered from a thread entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadAction {
    Block,
    Allow,
    MarkViewed,
}

impl ThreadAction {
    /// Map a hotkey (`KeyboardEvent.key`) to its action.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "b" | "B" => Some(Self::Block),
            "w" | "W" => Some(Self::Allow),
            "r" | "R" => Some(Self::MarkViewed),
            _ => None,
        }
    }

    /// Map a legacy `KeyboardEvent.keyCode` to its action.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            66 => Some(Self::Block),
            87 => Some(Self::Allow),
            82 => Some(Self::MarkViewed),
            _ => None,
        }
    }

    /// True if the entry disappears from the page once the action is taken.
    pub fn removes_entry(self) -> bool {
        matches!(self, Self::Block | Self::MarkViewed)
    }

    /// Apply the action to an in-memory document.
    pub fn apply(self, doc: &mut ConfigDocument, id: ThreadId, now: Timestamp) {
        match self {
            Self::Block => {
                mark_blocked(doc, id);
            }
            Self::Allow => {
                mark_allowed(doc, id);
            }
            Self::MarkViewed => {
                mark_viewed(doc, id, now);
            }
        }
    }
}

// =============================================================================
// Document Mutations
// =============================================================================

/// Add `id` to the block list. Returns false if it was already there.
pub fn mark_blocked(doc: &mut ConfigDocument, id: ThreadId) -> bool {
    doc.blocked.insert(id)
}

/// Add `id` to the allow list. Returns false if it was already there.
pub fn mark_allowed(doc: &mut ConfigDocument, id: ThreadId) -> bool {
    doc.allowed.insert(id)
}

/// Replace any view record for `id` with one at `now`.
pub fn mark_viewed(doc: &mut ConfigDocument, id: ThreadId, now: Timestamp) -> Option<Timestamp> {
    doc.viewed.record(id, now)
}

// =============================================================================
// Persisted Mutations
// =============================================================================

impl<S: KvStore> ConfigStore<S> {
    pub fn mark_blocked(&self, id: ThreadId) -> Result<bool, StoreError> {
        self.update(|doc| mark_blocked(doc, id))
    }

    pub fn mark_allowed(&self, id: ThreadId) -> Result<bool, StoreError> {
        self.update(|doc| mark_allowed(doc, id))
    }

    pub fn mark_viewed(&self, id: ThreadId, now: Timestamp) -> Result<Option<Timestamp>, StoreError> {
        self.update(|doc| mark_viewed(doc, id, now))
    }

    /// Apply `action` to `id` and persist the result.
    pub fn perform(&self, action: ThreadAction, id: ThreadId, now: Timestamp) -> Result<(), StoreError> {
        log::debug!("Applying {:?} to thread {}", action, id);
        self.update(|doc| action.apply(doc, id, now))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::store::MemoryStore;

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_hotkey_mapping() {
        assert_eq!(ThreadAction::from_key("b"), Some(ThreadAction::Block));
        assert_eq!(ThreadAction::from_key("W"), Some(ThreadAction::Allow));
        assert_eq!(ThreadAction::from_key("r"), Some(ThreadAction::MarkViewed));
        assert_eq!(ThreadAction::from_key("x"), None);
        assert_eq!(ThreadAction::from_key("Escape"), None);

        assert_eq!(ThreadAction::from_key_code(66), Some(ThreadAction::Block));
        assert_eq!(ThreadAction::from_key_code(87), Some(ThreadAction::Allow));
        assert_eq!(ThreadAction::from_key_code(82), Some(ThreadAction::MarkViewed));
        assert_eq!(ThreadAction::from_key_code(27), None);
    }

    #[test]
    fn test_removes_entry() {
        assert!(ThreadAction::Block.removes_entry());
        assert!(ThreadAction::MarkViewed.removes_entry());
        assert!(!ThreadAction::Allow.removes_entry());
    }

    #[test]
    fn test_mark_allowed_is_idempotent() {
        let mut doc = ConfigDocument::new();
        assert!(mark_allowed(&mut doc, "1".into()));
        assert!(!mark_allowed(&mut doc, "1".into()));
        assert_eq!(doc.allowed.len(), 1);
    }

    #[test]
    fn test_mark_viewed_replaces() {
        let store = ConfigStore::new(MemoryStore::new());
        store.mark_viewed("5".into(), at(9)).expect("first view");
        let previous = store.mark_viewed("5".into(), at(7)).expect("second view");
        assert_eq!(previous, Some(at(9)));

        let doc = store.load();
        assert_eq!(doc.viewed.len(), 1);
        assert_eq!(doc.viewed.get(&"5".into()), Some(at(7)));
    }

    #[test]
    fn test_perform_persists_each_action() {
        let store = ConfigStore::new(MemoryStore::new());
        store.perform(ThreadAction::Block, "1".into(), at(1)).expect("block");
        store.perform(ThreadAction::Allow, "2".into(), at(1)).expect("allow");
        store.perform(ThreadAction::MarkViewed, "3".into(), at(2)).expect("view");

        let doc = store.load();
        assert!(doc.blocked.contains(&"1".into()));
        assert!(doc.allowed.contains(&"2".into()));
        assert_eq!(doc.viewed.get(&"3".into()), Some(at(2)));
    }

    #[test]
    fn test_actions_keep_existing_state() {
        let store = ConfigStore::new(MemoryStore::new());
        store.mark_blocked("1".into()).expect("block");
        store.mark_blocked("2".into()).expect("block");
        store.mark_allowed("2".into()).expect("allow");

        let doc = store.load();
        assert_eq!(doc.blocked.len(), 2);
        assert!(doc.allowed.contains(&"2".into()));
    }
}
