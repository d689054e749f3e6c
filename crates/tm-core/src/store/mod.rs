//! Configuration persistence
//!
//! This module provides the wire format for the configuration document, the
//! key-value backend seam, and the store that owns the durable copy.

mod backend;
mod config_store;
pub mod format;

pub use backend::*;
pub use config_store::*;
