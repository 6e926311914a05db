//! Indexing pass implementation.

use crate::core::fingerprint::PerceptualHasher;
use crate::core::index::{IndexRecord, IndexStore};
use crate::core::source::{walk, SourceRef};
use crate::error::{Result, SourceError, WallpaperFinderError};
use crate::events::{null_sender, Event, EventSender, IndexEvent, IndexProgress};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag for a running indexing pass.
///
/// Clones share the same flag. The pass checks it once per entry.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the pass to stop at the next entry
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of an indexing pass
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    /// The source that was indexed
    pub source: SourceRef,
    /// Records committed to the index
    pub records_written: usize,
    /// Image entries that could not be read or decoded
    pub entries_skipped: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// How the pass's records reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Append,
    Replace,
}

/// Walks a source, fingerprints every image and writes the records.
///
/// Only one pass may run against a given store at a time; callers
/// serialize passes themselves (for example with an "indexing" flag).
pub struct Indexer {
    store: Arc<dyn IndexStore>,
    hasher: PerceptualHasher,
    events: EventSender,
    cancellation: CancellationToken,
}

impl Indexer {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self {
            store,
            hasher: PerceptualHasher::new(),
            events: null_sender(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Report progress through the given sender
    pub fn events(mut self, sender: EventSender) -> Self {
        self.events = sender;
        self
    }

    /// Stop early when the token is cancelled
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Index the first source; existing records are kept.
    pub fn index(&self, source: &SourceRef) -> Result<IndexSummary> {
        self.run(source, WriteMode::Append)
    }

    /// Index a newly selected source, replacing every existing record.
    ///
    /// The old records disappear in the same transaction that writes the
    /// new ones, so a concurrent match never sees a stale or empty index.
    pub fn reindex(&self, source: &SourceRef) -> Result<IndexSummary> {
        self.run(source, WriteMode::Replace)
    }

    fn run(&self, source: &SourceRef, mode: WriteMode) -> Result<IndexSummary> {
        let start_time = Instant::now();

        info!(source = %source, "indexing started");
        self.events.send(Event::Index(IndexEvent::Started {
            source: source.clone(),
        }));

        let walker = walk(source)?;

        let mut records = Vec::new();
        let mut skipped = 0;

        for entry in walker {
            if self.cancellation.is_cancelled() {
                info!(source = %source, "indexing cancelled");
                self.events.send(Event::Index(IndexEvent::Cancelled));
                return Err(WallpaperFinderError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "skipping unreadable entry");
                    self.events.send(Event::Index(IndexEvent::EntrySkipped {
                        entry_name: entry_name_of(&e),
                        reason: e.to_string(),
                    }));
                    continue;
                }
            };

            match self.hasher.hash_bytes(&entry.content, &entry.name) {
                Ok(fingerprint) => {
                    debug!(entry = %entry.name, %fingerprint, "fingerprinted");
                    records.push(IndexRecord::new(source.clone(), entry.name.clone(), fingerprint));
                    self.events.send(Event::Index(IndexEvent::EntryIndexed(IndexProgress {
                        indexed: records.len(),
                        skipped,
                        entry_name: entry.name,
                    })));
                }
                Err(e) => {
                    skipped += 1;
                    warn!(entry = %entry.name, error = %e, "skipping undecodable image");
                    self.events.send(Event::Index(IndexEvent::EntrySkipped {
                        entry_name: entry.name,
                        reason: e.to_string(),
                    }));
                }
            }
        }

        let records_written = match mode {
            WriteMode::Append => self.store.insert_batch(&records)?,
            WriteMode::Replace => {
                self.events.send(Event::Index(IndexEvent::Cleared));
                self.store.replace_all(&records)?
            }
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            source = %source,
            records_written,
            entries_skipped = skipped,
            duration_ms,
            "indexing finished"
        );
        self.events.send(Event::Index(IndexEvent::Completed {
            records_written,
            entries_skipped: skipped,
            duration_ms,
        }));

        Ok(IndexSummary {
            source: source.clone(),
            records_written,
            entries_skipped: skipped,
            duration_ms,
        })
    }
}

fn entry_name_of(error: &SourceError) -> String {
    match error {
        SourceError::ReadEntry { entry, .. } => entry.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::index::InMemoryIndexStore;
    use crate::events::EventChannel;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, seed: u32) {
        let img = ImageBuffer::from_fn(40, 40, |x, y| {
            let v = ((x * 7 + y * 13 + seed * 31) % 256) as u8;
            Rgb([v, v.wrapping_mul(3), 255 - v])
        });
        DynamicImage::ImageRgb8(img).save(dir.join(name)).unwrap();
    }

    fn folder(dir: &TempDir) -> SourceRef {
        SourceRef::Directory {
            path: dir.path().to_path_buf(),
        }
    }

    #[test]
    fn indexes_every_image() {
        let temp_dir = TempDir::new().unwrap();
        write_png(temp_dir.path(), "a.png", 1);
        write_png(temp_dir.path(), "b.png", 2);

        let store = Arc::new(InMemoryIndexStore::new());
        let summary = Indexer::new(store.clone()).index(&folder(&temp_dir)).unwrap();

        assert_eq!(summary.records_written, 2);
        assert_eq!(summary.entries_skipped, 0);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn corrupt_entry_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        write_png(temp_dir.path(), "good.png", 1);
        fs::write(temp_dir.path().join("corrupt.jpg"), b"this is not a valid image file").unwrap();

        let store = Arc::new(InMemoryIndexStore::new());
        let (sender, receiver) = EventChannel::new();
        let summary = Indexer::new(store.clone())
            .events(sender)
            .index(&folder(&temp_dir))
            .unwrap();

        assert_eq!(summary.records_written, 1);
        assert_eq!(summary.entries_skipped, 1);

        let skipped: Vec<_> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Index(IndexEvent::EntrySkipped { entry_name, .. }) => Some(entry_name),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec!["corrupt.jpg".to_string()]);
    }

    #[test]
    fn unavailable_source_is_an_error() {
        let store = Arc::new(InMemoryIndexStore::new());
        let source = SourceRef::Directory {
            path: "/nonexistent/wallpapers".into(),
        };

        let error = Indexer::new(store).index(&source).unwrap_err();
        assert!(error.is_source_unavailable());
    }

    #[test]
    fn reindex_replaces_previous_source() {
        let first = TempDir::new().unwrap();
        write_png(first.path(), "old1.png", 1);
        write_png(first.path(), "old2.png", 2);
        let second = TempDir::new().unwrap();
        write_png(second.path(), "new.png", 3);

        let store = Arc::new(InMemoryIndexStore::new());
        let indexer = Indexer::new(store.clone());
        indexer.index(&folder(&first)).unwrap();
        indexer.reindex(&folder(&second)).unwrap();

        let records = store.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_name, "new.png");
        assert_eq!(records[0].source, folder(&second));
    }

    #[test]
    fn cancelled_pass_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        write_png(temp_dir.path(), "a.png", 1);

        let store = Arc::new(InMemoryIndexStore::new());
        let token = CancellationToken::new();
        token.cancel();

        let result = Indexer::new(store.clone())
            .cancellation(token)
            .index(&folder(&temp_dir));

        assert!(matches!(result, Err(WallpaperFinderError::Cancelled)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn empty_source_writes_zero_records() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryIndexStore::new());

        let summary = Indexer::new(store).index(&folder(&temp_dir)).unwrap();
        assert_eq!(summary.records_written, 0);
    }

    #[test]
    fn progress_ends_with_completed() {
        let temp_dir = TempDir::new().unwrap();
        write_png(temp_dir.path(), "a.png", 1);

        let store = Arc::new(InMemoryIndexStore::new());
        let (sender, receiver) = EventChannel::new();
        Indexer::new(store).events(sender).index(&folder(&temp_dir)).unwrap();

        let events: Vec<_> = receiver.iter().collect();
        assert!(matches!(events.first(), Some(Event::Index(IndexEvent::Started { .. }))));
        assert!(matches!(
            events.last(),
            Some(Event::Index(IndexEvent::Completed {
                records_written: 1,
                ..
            }))
        ));
    }
}
