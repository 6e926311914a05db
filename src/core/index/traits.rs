//! Index store trait definition.

use super::IndexRecord;
use crate::error::IndexError;

/// Persisted table of index records.
///
/// Implementations must make every method atomic with respect to `scan`:
/// a scan observes the table either entirely before or entirely after any
/// `clear`, `insert_batch` or `replace_all`.
pub trait IndexStore: Send + Sync {
    /// Remove every record
    fn clear(&self) -> Result<(), IndexError>;

    /// Append records in a single transaction; returns how many were written
    fn insert_batch(&self, records: &[IndexRecord]) -> Result<usize, IndexError>;

    /// Clear and append in a single transaction.
    ///
    /// This is the change-source path: readers never see the empty table
    /// between the two steps, nor records from the discarded source.
    fn replace_all(&self, records: &[IndexRecord]) -> Result<usize, IndexError>;

    /// Visit every stored record in unspecified order.
    ///
    /// Rows that cannot be turned back into a record are passed to `visit`
    /// as [`IndexError::MalformedRecord`]; the returned error is reserved for
    /// failures of the scan itself.
    fn scan(
        &self,
        visit: &mut dyn FnMut(Result<IndexRecord, IndexError>),
    ) -> Result<(), IndexError>;

    /// Number of stored rows
    fn count(&self) -> Result<usize, IndexError>;

    /// Collect every well-formed record, dropping malformed rows
    fn records(&self) -> Result<Vec<IndexRecord>, IndexError> {
        let mut records = Vec::new();
        self.scan(&mut |row| {
            if let Ok(record) = row {
                records.push(record);
            }
        })?;
        Ok(records)
    }
}
