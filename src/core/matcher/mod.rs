//! # Matcher Module
//!
//! Finds the indexed wallpaper closest to a reference image.
//!
//! The lookup is a linear scan: every stored fingerprint is compared with
//! the reference by Hamming distance and the smallest distance wins. Each
//! comparison is a single 64-bit popcount, which keeps a scan of tens of
//! thousands of records well under interactive latency. A sublinear
//! structure (BK-tree, bit-sampling buckets) could replace the scan behind
//! [`Matcher::find_nearest`] without changing callers.
//!
//! ## Ties
//! When several records share the minimum distance, the first one seen in
//! the store's scan order is returned. `SqliteIndexStore` scans in
//! insertion order.

use crate::core::fingerprint::{decode_bytes, decode_file, Fingerprint, PerceptualHasher};
use crate::core::index::{IndexRecord, IndexStore};
use crate::error::{IndexError, Result};
use crate::events::{null_sender, Event, EventSender, MatchEvent};
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// The closest record to a reference image
#[derive(Debug, Clone, Serialize)]
pub struct NearestMatch {
    /// The matching index record
    pub record: IndexRecord,
    /// Hamming distance to the reference (0 = identical fingerprints)
    pub distance: u32,
    /// Similarity percentage derived from the distance
    pub similarity: f64,
}

impl NearestMatch {
    fn new(reference: &Fingerprint, record: IndexRecord) -> Self {
        let distance = reference.distance(&record.fingerprint);
        let similarity = reference.similarity(&record.fingerprint);
        Self {
            record,
            distance,
            similarity,
        }
    }
}

/// Running minimum over records offered one at a time
struct NearestFold<'a> {
    reference: &'a Fingerprint,
    best: Option<NearestMatch>,
}

impl<'a> NearestFold<'a> {
    fn new(reference: &'a Fingerprint) -> Self {
        Self {
            reference,
            best: None,
        }
    }

    /// Keep `record` only if it is strictly closer than the current best
    fn offer(&mut self, record: IndexRecord) {
        let distance = self.reference.distance(&record.fingerprint);
        if self.best.as_ref().map_or(true, |b| distance < b.distance) {
            self.best = Some(NearestMatch::new(self.reference, record));
        }
    }

    fn finish(self) -> Option<NearestMatch> {
        self.best
    }
}

/// Minimum-distance fold over records; the earliest record wins ties.
pub fn nearest<I>(reference: &Fingerprint, records: I) -> Option<NearestMatch>
where
    I: IntoIterator<Item = IndexRecord>,
{
    let mut fold = NearestFold::new(reference);
    for record in records {
        fold.offer(record);
    }
    fold.finish()
}

/// Nearest-neighbour lookup over an index store
pub struct Matcher {
    store: Arc<dyn IndexStore>,
    hasher: PerceptualHasher,
    events: EventSender,
}

impl Matcher {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self {
            store,
            hasher: PerceptualHasher::new(),
            events: null_sender(),
        }
    }

    /// Report skipped records and scan results through the given sender
    pub fn events(mut self, sender: EventSender) -> Self {
        self.events = sender;
        self
    }

    /// Find the record closest to a decoded reference image.
    ///
    /// Returns `Ok(None)` when the index is empty or holds only malformed
    /// records.
    pub fn find_nearest(&self, reference: &DynamicImage) -> Result<Option<NearestMatch>> {
        let fingerprint = self.hasher.hash_image(reference)?;
        self.find_nearest_fingerprint(&fingerprint)
    }

    /// Decode `bytes` and find the closest record
    pub fn find_nearest_bytes(&self, bytes: &[u8], name: &str) -> Result<Option<NearestMatch>> {
        let image = decode_bytes(bytes, name)?;
        self.find_nearest(&image)
    }

    /// Read and decode the image at `path` and find the closest record
    pub fn find_nearest_file(&self, path: &Path) -> Result<Option<NearestMatch>> {
        let image = decode_file(path)?;
        self.find_nearest(&image)
    }

    /// Find the record closest to an already computed fingerprint
    pub fn find_nearest_fingerprint(&self, reference: &Fingerprint) -> Result<Option<NearestMatch>> {
        let mut fold = NearestFold::new(reference);
        let mut scanned = 0usize;

        self.store.scan(&mut |row| {
            let record = match row {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "ignoring index record");
                    if let IndexError::MalformedRecord { id, reason } = e {
                        self.events
                            .send(Event::Match(MatchEvent::RecordSkipped { id, reason }));
                    }
                    return;
                }
            };

            scanned += 1;
            fold.offer(record);
        })?;

        let best = fold.finish();
        let best_distance = best.as_ref().map(|b| b.distance);
        debug!(%reference, scanned, ?best_distance, "match scan finished");
        self.events.send(Event::Match(MatchEvent::Completed {
            records_scanned: scanned,
            best_distance,
        }));

        Ok(best)
    }
}
