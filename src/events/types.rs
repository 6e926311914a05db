//! Event type definitions for progress reporting.

use crate::core::source::SourceRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All events emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Indexing pass events
    Index(IndexEvent),
    /// Nearest-match lookup events
    Match(MatchEvent),
}

/// Events during an indexing pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexEvent {
    /// Indexing has started
    Started { source: SourceRef },
    /// Existing records will be replaced when the pass commits
    Cleared,
    /// An entry was fingerprinted
    EntryIndexed(IndexProgress),
    /// An entry could not be read or decoded and was skipped
    EntrySkipped { entry_name: String, reason: String },
    /// The pass committed its records
    Completed {
        records_written: usize,
        entries_skipped: usize,
        duration_ms: u64,
    },
    /// The pass was abandoned; nothing was written
    Cancelled,
}

/// Progress information during indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProgress {
    /// Entries fingerprinted so far
    pub indexed: usize,
    /// Entries skipped so far
    pub skipped: usize,
    /// The entry just fingerprinted
    pub entry_name: String,
}

/// Events during a nearest-match lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A stored record could not be decoded and was ignored
    RecordSkipped { id: i64, reason: String },
    /// The scan finished
    Completed {
        records_scanned: usize,
        best_distance: Option<u32>,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Index(event) => fmt::Display::fmt(event, f),
            Event::Match(event) => fmt::Display::fmt(event, f),
        }
    }
}

impl fmt::Display for IndexEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexEvent::Started { source } => write!(f, "Indexing {}", source),
            IndexEvent::Cleared => write!(f, "Replacing existing index"),
            IndexEvent::EntryIndexed(progress) => {
                write!(f, "[{}] {}", progress.indexed, progress.entry_name)
            }
            IndexEvent::EntrySkipped { entry_name, reason } => {
                write!(f, "Skipped {}: {}", entry_name, reason)
            }
            IndexEvent::Completed {
                records_written,
                entries_skipped,
                duration_ms,
            } => write!(
                f,
                "Indexed {} images ({} skipped) in {:.1}s",
                records_written,
                entries_skipped,
                *duration_ms as f64 / 1000.0
            ),
            IndexEvent::Cancelled => write!(f, "Indexing cancelled"),
        }
    }
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchEvent::RecordSkipped { id, reason } => {
                write!(f, "Ignored index record {}: {}", id, reason)
            }
            MatchEvent::Completed {
                records_scanned,
                best_distance: Some(distance),
            } => write!(
                f,
                "Scanned {} records, best distance {}",
                records_scanned, distance
            ),
            MatchEvent::Completed {
                records_scanned,
                best_distance: None,
            } => write!(f, "Scanned {} records, no match", records_scanned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn events_are_serializable() {
        let event = Event::Index(IndexEvent::EntryIndexed(IndexProgress {
            indexed: 10,
            skipped: 1,
            entry_name: "img/10.jpg".to_string(),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Index(IndexEvent::EntryIndexed(p)) => {
                assert_eq!(p.indexed, 10);
                assert_eq!(p.entry_name, "img/10.jpg");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn events_render_as_log_lines() {
        let started = Event::Index(IndexEvent::Started {
            source: SourceRef::Archive {
                path: PathBuf::from("/walls.zip"),
            },
        });
        assert_eq!(started.to_string(), "Indexing zip /walls.zip");

        let skipped = Event::Index(IndexEvent::EntrySkipped {
            entry_name: "broken.png".to_string(),
            reason: "truncated".to_string(),
        });
        assert_eq!(skipped.to_string(), "Skipped broken.png: truncated");

        let completed = Event::Index(IndexEvent::Completed {
            records_written: 3,
            entries_skipped: 1,
            duration_ms: 1500,
        });
        assert_eq!(completed.to_string(), "Indexed 3 images (1 skipped) in 1.5s");
    }

    #[test]
    fn match_events_render() {
        let done = Event::Match(MatchEvent::Completed {
            records_scanned: 4,
            best_distance: None,
        });
        assert!(done.to_string().contains("no match"));
    }
}
