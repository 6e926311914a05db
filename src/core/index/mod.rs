//! # Index Module
//!
//! Persists one fingerprint per wallpaper so matching never has to reopen
//! the collection.
//!
//! ## Schema
//! ```sql
//! images(id INTEGER PRIMARY KEY AUTOINCREMENT, source_type TEXT,
//!        source_path TEXT, file_name TEXT, phash TEXT)
//! ```
//!
//! Records are immutable once written. The only mutations are appending a
//! batch and clearing the table (or both at once via `replace_all`).
//!
//! ## Backends
//! - `SqliteIndexStore` - Persistent storage using SQLite
//! - `InMemoryIndexStore` - For testing

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryIndexStore;
pub use sqlite::SqliteIndexStore;
pub use traits::IndexStore;

use crate::core::fingerprint::Fingerprint;
use crate::core::source::SourceRef;
use serde::{Deserialize, Serialize};

/// A stored fingerprint for one image of a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// The folder or archive the image belongs to
    pub source: SourceRef,
    /// Path of the image relative to the source root
    pub entry_name: String,
    /// Perceptual fingerprint of the image
    pub fingerprint: Fingerprint,
}

impl IndexRecord {
    pub fn new(source: SourceRef, entry_name: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            source,
            entry_name: entry_name.into(),
            fingerprint,
        }
    }

    /// Full location of the image, suitable for copying or revealing
    pub fn location(&self) -> String {
        self.source.entry_location(&self.entry_name)
    }
}
