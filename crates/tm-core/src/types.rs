//! Core type definitions for ThreadMan
//!
//! These types are shared by the store, the extractor and the visibility
//! engine. Sets are kept as ordered collections internally so every
//! serialization of the same document is byte-identical.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instant used for thread activity and view times.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Thread Identity
// =============================================================================

/// Opaque forum thread identifier, taken from the thread permalink.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id is a non-empty run of ASCII digits.
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ThreadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// =============================================================================
// Records
// =============================================================================

/// A thread as it appears on the current page. Rebuilt on every page load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub id: ThreadId,
    pub title: String,
    /// Time of the most recent post, as reported by the page.
    pub last_activity: Timestamp,
}

impl ThreadRecord {
    pub fn new(id: impl Into<ThreadId>, title: impl Into<String>, last_activity: Timestamp) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            last_activity,
        }
    }
}

/// When the user last opened or acknowledged a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRecord {
    pub id: ThreadId,
    pub last_viewed: Timestamp,
}

// =============================================================================
// Viewed Log
// =============================================================================

/// Persisted set of view records, at most one per thread id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewLog {
    entries: BTreeMap<ThreadId, Timestamp>,
}

impl ViewLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ThreadId) -> Option<Timestamp> {
        self.entries.get(id).copied()
    }

    /// Record a view of `id` at `at`, replacing any previous record for it.
    ///
    /// Returns the replaced view time, if there was one.
    pub fn record(&mut self, id: ThreadId, at: Timestamp) -> Option<Timestamp> {
        self.entries.insert(id, at)
    }

    /// Fold in a record that may duplicate an existing id, keeping the latest
    /// view time.
    ///
    /// Hand-edited state can carry several records for one thread. Any one of
    /// them being newer than the thread's activity hides it, which holds
    /// exactly when the latest one is.
    pub fn merge(&mut self, record: ViewRecord) {
        match self.entries.entry(record.id) {
            btree_map::Entry::Occupied(mut slot) => {
                if record.last_viewed > *slot.get() {
                    slot.insert(record.last_viewed);
                }
            }
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record.last_viewed);
            }
        }
    }

    /// True if `id` was viewed strictly after `activity`.
    pub fn viewed_since(&self, id: &ThreadId, activity: Timestamp) -> bool {
        self.entries.get(id).is_some_and(|viewed| *viewed > activity)
    }

    pub fn iter(&self) -> impl Iterator<Item = ViewRecord> + '_ {
        self.entries.iter().map(|(id, at)| ViewRecord {
            id: id.clone(),
            last_viewed: *at,
        })
    }
}

impl FromIterator<ViewRecord> for ViewLog {
    fn from_iter<I: IntoIterator<Item = ViewRecord>>(iter: I) -> Self {
        let mut log = ViewLog::new();
        for record in iter {
            log.merge(record);
        }
        log
    }
}

// =============================================================================
// Configuration Document
// =============================================================================

/// The single persisted configuration: allow list, block list and viewed log.
///
/// An id may sit in both `allowed` and `blocked`; the visibility engine gives
/// the allow list a total override whenever it is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    pub allowed: BTreeSet<ThreadId>,
    pub blocked: BTreeSet<ThreadId>,
    pub viewed: ViewLog,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when only allow-listed threads are shown.
    pub fn is_allow_list_mode(&self) -> bool {
        !self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_thread_id_numeric() {
        assert!(ThreadId::from("42").is_numeric());
        assert!(!ThreadId::from("").is_numeric());
        assert!(!ThreadId::from("4a").is_numeric());
        assert!(!ThreadId::from(" 42").is_numeric());
    }

    #[test]
    fn test_record_replaces_previous_view() {
        let mut log = ViewLog::new();
        assert_eq!(log.record("5".into(), at(10)), None);
        assert_eq!(log.record("5".into(), at(3)), Some(at(10)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(&"5".into()), Some(at(3)));
    }

    #[test]
    fn test_merge_keeps_latest_duplicate() {
        let log: ViewLog = vec![
            ViewRecord { id: "5".into(), last_viewed: at(2) },
            ViewRecord { id: "5".into(), last_viewed: at(9) },
            ViewRecord { id: "5".into(), last_viewed: at(4) },
        ]
        .into_iter()
        .collect();

        assert_eq!(log.len(), 1);
        assert_eq!(log.get(&"5".into()), Some(at(9)));
    }

    #[test]
    fn test_viewed_since_is_strict() {
        let mut log = ViewLog::new();
        log.record("5".into(), at(10));

        assert!(log.viewed_since(&"5".into(), at(5)));
        assert!(!log.viewed_since(&"5".into(), at(10)));
        assert!(!log.viewed_since(&"5".into(), at(15)));
        assert!(!log.viewed_since(&"6".into(), at(1)));
    }
}
