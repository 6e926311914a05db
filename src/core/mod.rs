//! # Core Module
//!
//! The UI-agnostic wallpaper lookup engine.
//!
//! ## Modules
//! - `fingerprint` - Decodes images and computes DCT perceptual hashes
//! - `source` - Resolves and walks folder or ZIP image collections
//! - `index` - Persists one fingerprint per collection image
//! - `indexer` - Builds the index from a source
//! - `matcher` - Finds the indexed image nearest to a reference

pub mod fingerprint;
pub mod index;
pub mod indexer;
pub mod matcher;
pub mod source;

// Re-export commonly used types
pub use fingerprint::{Fingerprint, PerceptualHasher};
pub use index::{InMemoryIndexStore, IndexRecord, IndexStore, SqliteIndexStore};
pub use indexer::{CancellationToken, IndexSummary, Indexer};
pub use matcher::{Matcher, NearestMatch};
pub use source::{SourceEntry, SourceKind, SourceRef};
