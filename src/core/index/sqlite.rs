//! SQLite index backend for persistent storage.

use super::{IndexRecord, IndexStore};
use crate::core::fingerprint::{Fingerprint, FINGERPRINT_VERSION};
use crate::core::source::SourceRef;
use crate::error::IndexError;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed persistent index
///
/// Uses WAL (Write-Ahead Logging) mode so that matching can read while
/// another process is indexing. Every scan is a single statement and
/// therefore reads from one consistent snapshot.
pub struct SqliteIndexStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

/// A row as stored, before validation
struct RawRow {
    id: i64,
    source_type: Option<String>,
    source_path: Option<String>,
    file_name: Option<String>,
    phash: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let text = |idx: usize| -> rusqlite::Result<Option<String>> {
            Ok(row.get_ref(idx)?.as_str().ok().map(str::to_owned))
        };

        Ok(Self {
            id: row.get(0)?,
            source_type: text(1)?,
            source_path: text(2)?,
            file_name: text(3)?,
            phash: text(4)?,
        })
    }

    fn into_record(self) -> Result<IndexRecord, IndexError> {
        let id = self.id;
        let malformed = |reason: String| IndexError::MalformedRecord { id, reason };

        let (kind, path) = self
            .source_type
            .zip(self.source_path)
            .ok_or_else(|| malformed("missing source".to_string()))?;
        let source = SourceRef::from_parts(&kind, path)
            .ok_or_else(|| malformed(format!("unknown source type {:?}", kind)))?;
        let entry_name = self
            .file_name
            .ok_or_else(|| malformed("missing file name".to_string()))?;
        let phash = self
            .phash
            .ok_or_else(|| malformed("missing fingerprint".to_string()))?;
        let fingerprint = Fingerprint::from_hex(&phash).map_err(|e| malformed(e.to_string()))?;

        Ok(IndexRecord {
            source,
            entry_name,
            fingerprint,
        })
    }
}

/// Rows already present in an unstamped database (0 if it has no table)
fn unstamped_rows(conn: &Connection) -> Result<i64, IndexError> {
    let query_failed = |e: rusqlite::Error| IndexError::QueryFailed(e.to_string());

    let has_table: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'images')",
            [],
            |row| row.get(0),
        )
        .map_err(query_failed)?;
    if !has_table {
        return Ok(0);
    }

    conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
        .map_err(query_failed)
}

impl SqliteIndexStore {
    /// Open or create an index database at the given path.
    ///
    /// Idempotent and safe to call from several processes at once; schema
    /// creation runs inside an immediate transaction.
    pub fn open_or_create(path: &Path) -> Result<Self, IndexError> {
        let open_failed = |reason: String| IndexError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| open_failed(e.to_string()))?;
        }

        let mut conn = Connection::open(path).map_err(|e| open_failed(e.to_string()))?;

        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| open_failed(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        let version: i64 = tx
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        // 0 = unstamped; only an empty one can be adopted, since any rows
        // in it were hashed with unknown parameters
        let compatible = match version {
            0 => unstamped_rows(&tx)? == 0,
            v => v == FINGERPRINT_VERSION,
        };
        if !compatible {
            return Err(IndexError::IncompatibleFingerprint {
                path: path.to_path_buf(),
                found: version,
                expected: FINGERPRINT_VERSION,
            });
        }

        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_type TEXT NOT NULL,
                source_path TEXT NOT NULL,
                file_name TEXT NOT NULL,
                phash TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_phash ON images(phash);
            PRAGMA user_version = {};",
            FINGERPRINT_VERSION
        ))
        .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        tx.commit()
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        debug!(path = %path.display(), "opened index database");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Open an index database that must already exist.
    ///
    /// Matching uses this so that a missing index is reported instead of
    /// silently creating an empty one.
    pub fn open_existing(path: &Path) -> Result<Self, IndexError> {
        if !path.is_file() {
            return Err(IndexError::Missing {
                path: path.to_path_buf(),
            });
        }
        Self::open_or_create(path)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, IndexError> {
        self.conn.lock().map_err(|_| IndexError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    fn write_batch(&self, records: &[IndexRecord], clear_first: bool) -> Result<usize, IndexError> {
        let mut conn = self.lock()?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        if clear_first {
            tx.execute("DELETE FROM images", [])
                .map_err(|e| IndexError::QueryFailed(e.to_string()))?;
        }

        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO images (source_type, source_path, file_name, phash)
                     VALUES (?, ?, ?, ?)",
                )
                .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

            for record in records {
                stmt.execute(params![
                    record.source.kind().as_str(),
                    record.source.path().to_string_lossy(),
                    record.entry_name,
                    record.fingerprint.to_hex(),
                ])
                .map_err(|e| IndexError::QueryFailed(e.to_string()))?;
            }
        }

        // Dropping the transaction without commit rolls the whole batch back
        tx.commit()
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        Ok(records.len())
    }
}

impl IndexStore for SqliteIndexStore {
    fn clear(&self) -> Result<(), IndexError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM images", [])
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn insert_batch(&self, records: &[IndexRecord]) -> Result<usize, IndexError> {
        self.write_batch(records, false)
    }

    fn replace_all(&self, records: &[IndexRecord]) -> Result<usize, IndexError> {
        self.write_batch(records, true)
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(Result<IndexRecord, IndexError>),
    ) -> Result<(), IndexError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, source_type, source_path, file_name, phash
                 FROM images ORDER BY id",
            )
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], RawRow::from_row)
            .map_err(|e| IndexError::QueryFailed(e.to_string()))?;

        for row in rows {
            let row = row.map_err(|e| IndexError::QueryFailed(e.to_string()))?;
            visit(row.into_record());
        }

        Ok(())
    }

    fn count(&self) -> Result<usize, IndexError> {
        let conn = self.lock()?;

        conn.query_row("SELECT COUNT(*) FROM images", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| IndexError::QueryFailed(e.to_string()))
    }
}
