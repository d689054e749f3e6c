//! ThreadMan Core Library
//!
//! This crate provides the decision core for the ThreadMan forum content script.
//! It is free of any rendering surface: the browser bindings and the CLI both
//! drive it through plain function calls.
//!
//! # Architecture
//!
//! A single [`ConfigDocument`] (allow list, block list, viewed log) is owned by
//! the [`ConfigStore`], which persists it as one serialized value under one key
//! of a generic key-value backend. On every page evaluation the document is
//! loaded, the page's thread entries are extracted into [`ThreadRecord`]s, and
//! the [`VisibilityEngine`] decides per thread whether it is hidden.
//!
//! # Modules
//!
//! - `types`: Thread ids, thread/view records and the configuration document
//! - `store`: Wire format, key-value backend seam and the config store
//! - `extract`: Thread extraction from the two forum page layouts
//! - `visibility`: Allow/block resolution and the viewed-since-update override
//! - `actions`: Block / allow / mark-viewed mutations and their hotkeys

pub mod actions;
pub mod extract;
pub mod store;
pub mod types;
pub mod visibility;

// Re-export commonly used types
pub use actions::ThreadAction;
pub use extract::{extract_thread, extract_threads, EntryNode, ExtractError, PageLayout};
pub use store::{ConfigStore, KvStore, MemoryStore, StoreError, STORAGE_KEY};
pub use types::{ConfigDocument, ThreadId, ThreadRecord, Timestamp, ViewLog, ViewRecord};
pub use visibility::{Decision, DecisionReason, EvaluationSummary, VisibilityEngine};
