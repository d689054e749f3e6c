//! ThreadMan Settings
//!
//! This crate turns the settings dialog's three text areas into a new
//! configuration document and renders a document back into text.

pub mod form;
pub mod parser;

pub use form::{SettingsError, SettingsForm};
pub use parser::{format_id_list, parse_id_list};
