//! In-memory index backend for testing.

use super::{IndexRecord, IndexStore};
use crate::error::IndexError;
use std::path::PathBuf;
use std::sync::RwLock;

/// In-memory index backend
///
/// Useful for testing and for callers that rebuild the index every run.
/// Scans hold the read lock for their whole duration, writers the write
/// lock, which gives the same all-before-or-all-after view as SQLite.
pub struct InMemoryIndexStore {
    records: RwLock<Vec<IndexRecord>>,
}

impl InMemoryIndexStore {
    /// Create a new, empty in-memory index
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    fn poisoned() -> IndexError {
        IndexError::Corrupted {
            path: PathBuf::from("memory"),
        }
    }
}

impl Default for InMemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore for InMemoryIndexStore {
    fn clear(&self) -> Result<(), IndexError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.clear();
        Ok(())
    }

    fn insert_batch(&self, batch: &[IndexRecord]) -> Result<usize, IndexError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.extend_from_slice(batch);
        Ok(batch.len())
    }

    fn replace_all(&self, batch: &[IndexRecord]) -> Result<usize, IndexError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.clear();
        records.extend_from_slice(batch);
        Ok(batch.len())
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(Result<IndexRecord, IndexError>),
    ) -> Result<(), IndexError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        for record in records.iter() {
            visit(Ok(record.clone()));
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, IndexError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.len())
    }
}
