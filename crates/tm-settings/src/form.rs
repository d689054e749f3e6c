//! Settings dialog contents
//!
//! The dialog edits the whole configuration as three text areas: block list,
//! allow list, and the raw viewed log as JSON (an escape hatch for fixing
//! state by hand).

use tm_core::store::format::{decode_view_log, encode_view_log, FormatError};
use tm_core::{ConfigDocument, ConfigStore, KvStore, StoreError, ViewLog};

use crate::parser::{format_id_list, parse_id_list};

/// Error type for applying edited settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid viewed thread log: {0}")]
    InvalidViewLog(#[source] FormatError),
    #[error("Failed to render viewed thread log: {0}")]
    RenderViewLog(#[source] FormatError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Text contents of the settings dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub blocked: String,
    pub allowed: String,
    pub viewed: String,
}

impl SettingsForm {
    /// Render a document into dialog text.
    pub fn from_document(doc: &ConfigDocument) -> Result<Self, SettingsError> {
        Ok(Self {
            blocked: format_id_list(&doc.blocked),
            allowed: format_id_list(&doc.allowed),
            viewed: encode_view_log(&doc.viewed).map_err(SettingsError::RenderViewLog)?,
        })
    }

    /// Build the document the dialog describes.
    ///
    /// Invalid ids are dropped, as are view records whose time cannot be read.
    /// A viewed log that is not a JSON array rejects the whole form so nothing
    /// half-edited gets saved.
    pub fn to_document(&self) -> Result<ConfigDocument, SettingsError> {
        let viewed_text = self.viewed.trim();
        let viewed = if viewed_text.is_empty() {
            ViewLog::new()
        } else {
            decode_view_log(viewed_text).map_err(SettingsError::InvalidViewLog)?
        };

        Ok(ConfigDocument {
            allowed: parse_id_list(&self.allowed),
            blocked: parse_id_list(&self.blocked),
            viewed,
        })
    }

    /// Load the current settings from `store`.
    pub fn load<S: KvStore>(store: &ConfigStore<S>) -> Result<Self, SettingsError> {
        Self::from_document(&store.load())
    }

    /// Replace the stored document with the one this form describes.
    pub fn save<S: KvStore>(&self, store: &ConfigStore<S>) -> Result<ConfigDocument, SettingsError> {
        let doc = self.to_document()?;
        store.save(&doc)?;
        Ok(doc)
    }
}
