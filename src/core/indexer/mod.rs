//! # Indexer Module
//!
//! Builds the fingerprint index from a wallpaper source.
//!
//! ## Pass
//! 1. **Walk** - Enumerate image entries of the folder or archive
//! 2. **Fingerprint** - Decode and hash each entry; broken images are skipped
//! 3. **Commit** - Write every record in one transaction
//!
//! A pass that fails or is cancelled before the commit leaves the index
//! exactly as it was. The engine does no threading of its own; run long
//! passes on a worker thread and follow them through the event channel.

mod executor;

pub use executor::{CancellationToken, IndexSummary, Indexer};
