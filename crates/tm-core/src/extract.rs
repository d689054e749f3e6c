//! Thread extraction from forum pages
//!
//! Two layouts carry thread entries:
//!
//! - the compact "latest threads" listing (`.latest_threads > span`), whose
//!   entries are spans of `[span, a(link), .., span(time)]`
//! - the tabular forum listing (`table.forum_list tr.rowa/rowb`), whose rows
//!   hold the thread link as their first anchor and a `span.time`
//!
//! The layout is sniffed per entry: a first child element that is a `span`
//! marks a latest-listing entry. Entries are read through [`EntryNode`], so the
//! parsing here runs the same against a live DOM or a test fixture.
//!
//! Page times carry no offset; they are wall-clock times in the viewer's zone.
//! Callers pass that zone: `chrono::Local` in the browser, `Utc` elsewhere.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::types::{ThreadId, ThreadRecord, Timestamp};

/// Entries of the latest-threads listing.
pub const LATEST_THREADS_SELECTOR: &str = ".latest_threads > span";
/// Rows of the forum listing.
pub const FORUM_THREADS_SELECTOR: &str = "table.forum_list tr.rowa, table.forum_list tr.rowb";

const THREAD_PATH_MARKER: &str = "/thread/";

/// Human timestamp formats shown by the forum, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%b %d %Y, %H:%M",
    "%b %d %Y %H:%M",
    "%b %d %Y, %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Date-only forms, read as local midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d %Y"];

// =============================================================================
// Entry Access
// =============================================================================

/// Read-only view of a page element holding one thread entry.
pub trait EntryNode: Sized {
    /// Lowercase tag name.
    fn tag_name(&self) -> String;

    /// Child elements, in document order.
    fn child_elements(&self) -> Vec<Self>;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Concatenated text of the element and its descendants.
    fn text(&self) -> String;

    /// First descendant matching a simple selector (`tag` or `tag.class`).
    fn select_first(&self, selector: &str) -> Option<Self>;
}

/// Page layout an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageLayout {
    LatestThreads,
    ForumTable,
}

impl PageLayout {
    /// Selector for the entries of this layout.
    pub fn entry_selector(self) -> &'static str {
        match self {
            Self::LatestThreads => LATEST_THREADS_SELECTOR,
            Self::ForumTable => FORUM_THREADS_SELECTOR,
        }
    }
}

/// Error type for a thread entry that cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Entry has no child element at index {0}")]
    MissingChild(usize),
    #[error("Entry has no thread link")]
    MissingLink,
    #[error("Entry has no timestamp")]
    MissingTimestamp,
    #[error("Not a thread link: {0}")]
    InvalidThreadLink(String),
    #[error("Unparsable timestamp: {0}")]
    InvalidTimestamp(String),
}

// =============================================================================
// Extraction
// =============================================================================

/// A successfully read entry, paired with the node it came from.
#[derive(Debug)]
pub struct ExtractedThread<'a, N> {
    pub node: &'a N,
    pub layout: PageLayout,
    pub record: ThreadRecord,
}

/// Sniff the layout of an entry from its first child element.
pub fn detect_layout<N: EntryNode>(entry: &N) -> PageLayout {
    match entry.child_elements().first() {
        Some(first) if first.tag_name().eq_ignore_ascii_case("span") => PageLayout::LatestThreads,
        _ => PageLayout::ForumTable,
    }
}

/// Read one entry into a thread record, taking page times as wall-clock
/// times in `zone`.
pub fn extract_thread<N: EntryNode, Tz: TimeZone>(entry: &N, zone: &Tz) -> Result<ThreadRecord, ExtractError> {
    match detect_layout(entry) {
        PageLayout::LatestThreads => extract_latest(entry, zone),
        PageLayout::ForumTable => extract_forum_row(entry, zone),
    }
}

/// Read every entry, skipping the ones that cannot be parsed.
pub fn extract_threads<'a, N: EntryNode, Tz: TimeZone>(entries: &'a [N], zone: &Tz) -> Vec<ExtractedThread<'a, N>> {
    let mut threads = Vec::with_capacity(entries.len());
    for (index, node) in entries.iter().enumerate() {
        let layout = detect_layout(node);
        match extract_thread(node, zone) {
            Ok(record) => threads.push(ExtractedThread { node, layout, record }),
            Err(e) => log::debug!("Skipping thread entry {}: {}", index, e),
        }
    }
    threads
}

fn extract_latest<N: EntryNode, Tz: TimeZone>(entry: &N, zone: &Tz) -> Result<ThreadRecord, ExtractError> {
    let children = entry.child_elements();
    let link = children.get(1).ok_or(ExtractError::MissingChild(1))?;
    let time = children.get(3).ok_or(ExtractError::MissingChild(3))?;

    let href = link.attribute("href").ok_or(ExtractError::MissingLink)?;
    let id = parse_thread_id(&href).ok_or(ExtractError::InvalidThreadLink(href))?;
    let raw_time = time.attribute("title").ok_or(ExtractError::MissingTimestamp)?;
    let last_activity = parse_timestamp(&raw_time, zone).ok_or(ExtractError::InvalidTimestamp(raw_time))?;

    Ok(ThreadRecord {
        id,
        title: link.text().trim().to_string(),
        last_activity,
    })
}

fn extract_forum_row<N: EntryNode, Tz: TimeZone>(entry: &N, zone: &Tz) -> Result<ThreadRecord, ExtractError> {
    let link = entry.select_first("a").ok_or(ExtractError::MissingLink)?;
    let href = link.attribute("href").ok_or(ExtractError::MissingLink)?;
    let id = parse_thread_id(&href).ok_or(ExtractError::InvalidThreadLink(href))?;

    let raw_time = entry
        .select_first("span.time")
        .and_then(|time| time.attribute("title"))
        .ok_or(ExtractError::MissingTimestamp)?;
    let last_activity = parse_timestamp(&raw_time, zone).ok_or(ExtractError::InvalidTimestamp(raw_time))?;

    Ok(ThreadRecord {
        id,
        title: link.text().trim().to_string(),
        last_activity,
    })
}

// =============================================================================
// Field Parsing
// =============================================================================

/// Extract the thread id from a permalink such as
/// `/forum/thread/12345?postid=9#post9`.
pub fn parse_thread_id(href: &str) -> Option<ThreadId> {
    let (_, rest) = href.split_once(THREAD_PATH_MARKER)?;
    let end = rest.find(['?', '#', '/']).unwrap_or(rest.len());
    let id = rest[..end].trim();
    if id.is_empty() {
        None
    } else {
        Some(ThreadId::from(id))
    }
}

/// Parse a page timestamp. Times without an offset are wall-clock times in
/// `zone`; a time skipped by a DST jump does not parse, and an ambiguous one
/// takes the earlier instant.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, zone: &Tz) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
