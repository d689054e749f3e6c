use std::collections::BTreeSet;

use tm_core::ThreadId;

/// Parse a comma-separated id list.
///
/// Tokens are trimmed; empty and non-numeric tokens are dropped without
/// complaint.
pub fn parse_id_list(text: &str) -> BTreeSet<ThreadId> {
    let mut ids = BTreeSet::new();
    let mut dropped = 0usize;

    for token in text.trim().split(',') {
        let id = ThreadId::from(token.trim());
        if id.is_numeric() {
            ids.insert(id);
        } else if !id.as_str().is_empty() {
            dropped += 1;
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} invalid thread id(s) from settings input", dropped);
    }
    ids
}

/// Render an id list the way the settings dialog shows it: comma-joined.
pub fn format_id_list(ids: &BTreeSet<ThreadId>) -> String {
    ids.iter().map(ThreadId::as_str).collect::<Vec<_>>().join(",")
}
