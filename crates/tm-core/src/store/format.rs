//! Persisted document wire format
//!
//! The stored value is a JSON object whose thread lists are themselves
//! JSON-encoded strings:
//!
//! ```text
//! {
//!   "options": {
//!     "whitelist": { "threads": "[\"42\"]" },
//!     "blacklist": { "threads": "[\"7\"]" }
//!   },
//!   "userSelected": { "threads": "[{\"id\":\"5\",\"lastClicked\":\"2024-01-10T00:00:00.000Z\"}]" }
//! }
//! ```
//!
//! Sets go out as sorted sequences and come back as sets, so order on the
//! wire never matters.
//!
//! `lastClicked` is written as RFC 3339 with milliseconds. Older or
//! hand-edited state may hold other date forms (`2024-01-10`,
//! `Jan 10 2024`); those are read as UTC, and a view record that still
//! cannot be read is dropped on its own.

use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::parse_timestamp;
use crate::types::{ConfigDocument, ThreadId, Timestamp, ViewLog, ViewRecord};

/// Error type for encoding and decoding the persisted document.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Wire Structures
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct WireDocument {
    options: WireRuleLists,
    #[serde(rename = "userSelected")]
    user_selected: WireThreads,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireRuleLists {
    whitelist: WireThreads,
    blacklist: WireThreads,
}

/// A thread list, carried as an embedded JSON array string.
#[derive(Debug, Serialize, Deserialize)]
struct WireThreads {
    threads: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireViewRecord {
    id: ThreadId,
    #[serde(rename = "lastClicked", alias = "lastViewed")]
    last_viewed: String,
}

impl WireViewRecord {
    fn from_record(record: ViewRecord) -> Self {
        Self {
            id: record.id,
            last_viewed: record.last_viewed.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    fn to_record(&self) -> Option<ViewRecord> {
        let last_viewed: Timestamp = parse_timestamp(&self.last_viewed, &Utc)?;
        Some(ViewRecord {
            id: self.id.clone(),
            last_viewed,
        })
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a whole document into its stored string form.
pub fn encode_document(doc: &ConfigDocument) -> Result<String, FormatError> {
    let wire = WireDocument {
        options: WireRuleLists {
            whitelist: WireThreads {
                threads: encode_id_set(&doc.allowed)?,
            },
            blacklist: WireThreads {
                threads: encode_id_set(&doc.blocked)?,
            },
        },
        user_selected: WireThreads {
            threads: encode_view_log(&doc.viewed)?,
        },
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Encode an id set as a JSON array string.
pub fn encode_id_set(ids: &BTreeSet<ThreadId>) -> Result<String, FormatError> {
    Ok(serde_json::to_string(ids)?)
}

/// Encode the viewed log as a JSON array of `{id, lastClicked}` objects.
pub fn encode_view_log(log: &ViewLog) -> Result<String, FormatError> {
    let records: Vec<WireViewRecord> = log.iter().map(WireViewRecord::from_record).collect();
    Ok(serde_json::to_string(&records)?)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a stored document. A malformed list fails the whole decode; an
/// unreadable view record is skipped.
pub fn decode_document(raw: &str) -> Result<ConfigDocument, FormatError> {
    let wire: WireDocument = serde_json::from_str(raw)?;
    Ok(ConfigDocument {
        allowed: decode_id_set(&wire.options.whitelist.threads)?,
        blocked: decode_id_set(&wire.options.blacklist.threads)?,
        viewed: decode_view_log(&wire.user_selected.threads)?,
    })
}

pub fn decode_id_set(raw: &str) -> Result<BTreeSet<ThreadId>, FormatError> {
    let ids: Vec<ThreadId> = serde_json::from_str(raw)?;
    Ok(ids.into_iter().collect())
}

/// Decode a viewed log. Duplicate ids collapse to their latest view time.
///
/// The log must be a JSON array. Elements that are not `{id, lastClicked}`
/// records with a readable time are logged and skipped.
pub fn decode_view_log(raw: &str) -> Result<ViewLog, FormatError> {
    let items: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut log = ViewLog::new();
    for (index, item) in items.into_iter().enumerate() {
        let record = serde_json::from_value::<WireViewRecord>(item)
            .map_err(|e| e.to_string())
            .and_then(|wire| {
                wire.to_record()
                    .ok_or_else(|| format!("unreadable time '{}'", wire.last_viewed))
            });
        match record {
            Ok(record) => log.merge(record),
            Err(e) => log::warn!("Dropping view record {}: {}", index, e),
        }
    }
    Ok(log)
}
