//! # Source Module
//!
//! The wallpaper collection being indexed: a folder tree or a ZIP archive.
//!
//! A user-chosen path is resolved into a [`SourceRef`] exactly once, when the
//! source is selected. Every later operation works from the tagged value and
//! never re-sniffs the path.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - BMP (.bmp)
//! - GIF (.gif)
//! - WebP (.webp)
//!
//! ## Example
//! ```rust,ignore
//! use wallpaper_finder::core::source::{walk, SourceRef};
//!
//! let source = SourceRef::detect("~/Pictures/walls.zip".as_ref())?;
//! for entry in walk(&source)? {
//!     let entry = entry?;
//!     println!("{} ({} bytes)", entry.name, entry.content.len());
//! }
//! ```

mod filter;
mod walker;

pub use filter::{ImageFilter, IMAGE_EXTENSIONS};
pub use walker::{walk, ArchiveWalker, DirectoryWalker, SourceWalker};

use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Persisted tag of a source, as stored in the index and in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Zip,
    Folder,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Zip => "zip",
            SourceKind::Folder => "folder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "zip" => Some(SourceKind::Zip),
            "folder" => Some(SourceKind::Folder),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a wallpaper collection lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceRef {
    /// A ZIP file; entries are its member paths
    Archive { path: PathBuf },
    /// A folder; entries are file paths relative to it
    Directory { path: PathBuf },
}

impl SourceRef {
    /// Resolve a user-selected path into a source.
    ///
    /// An existing directory becomes a `Directory`; a file that opens as a
    /// ZIP archive becomes an `Archive`. Anything else is rejected.
    pub fn detect(path: &Path) -> Result<Self, SourceError> {
        let metadata = fs::metadata(path).map_err(|e| walker::open_error(path, e))?;
        let absolute = std::path::absolute(path).map_err(|e| walker::open_error(path, e))?;

        if metadata.is_dir() {
            return Ok(SourceRef::Directory { path: absolute });
        }

        let file = File::open(path).map_err(|e| walker::open_error(path, e))?;
        match zip::ZipArchive::new(BufReader::new(file)) {
            Ok(_) => Ok(SourceRef::Archive { path: absolute }),
            Err(_) => Err(SourceError::Unsupported { path: absolute }),
        }
    }

    /// Rebuild a source from its persisted tag and path
    pub fn from_parts(kind: &str, path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        SourceKind::parse(kind).map(|kind| match kind {
            SourceKind::Zip => SourceRef::Archive { path },
            SourceKind::Folder => SourceRef::Directory { path },
        })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceRef::Archive { .. } => SourceKind::Zip,
            SourceRef::Directory { .. } => SourceKind::Folder,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourceRef::Archive { path } | SourceRef::Directory { path } => path,
        }
    }

    /// Human-readable location of an entry inside this source.
    ///
    /// Folder entries become a plain file path; archive entries are written
    /// as `<archive>!/<entry>`.
    pub fn entry_location(&self, entry_name: &str) -> String {
        match self {
            SourceRef::Directory { path } => path
                .join(entry_name.replace('/', std::path::MAIN_SEPARATOR_STR))
                .display()
                .to_string(),
            SourceRef::Archive { path } => format!("{}!/{}", path.display(), entry_name),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path().display())
    }
}

/// One candidate image read out of a source
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Path relative to the source root (`/`-separated)
    pub name: String,
    /// Raw, still-encoded image bytes
    pub content: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn kind_round_trips_through_text() {
        assert_eq!(SourceKind::parse("zip"), Some(SourceKind::Zip));
        assert_eq!(SourceKind::parse("folder"), Some(SourceKind::Folder));
        assert_eq!(SourceKind::parse("ZIP"), None);
        assert_eq!(SourceKind::Folder.to_string(), "folder");
    }

    #[test]
    fn from_parts_rebuilds_variants() {
        assert_eq!(
            SourceRef::from_parts("zip", "/w.zip"),
            Some(SourceRef::Archive {
                path: PathBuf::from("/w.zip")
            })
        );
        assert_eq!(
            SourceRef::from_parts("folder", "/w"),
            Some(SourceRef::Directory {
                path: PathBuf::from("/w")
            })
        );
        assert_eq!(SourceRef::from_parts("tarball", "/w.tar"), None);
    }

    #[test]
    fn detect_directory() {
        let temp_dir = TempDir::new().unwrap();
        let source = SourceRef::detect(temp_dir.path()).unwrap();
        assert_eq!(source.kind(), SourceKind::Folder);
        assert!(source.path().is_absolute());
    }

    #[test]
    fn detect_zip_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("walls.zip");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("a.png", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"png").unwrap();
        zip.finish().unwrap();

        let source = SourceRef::detect(&path).unwrap();
        assert_eq!(source.kind(), SourceKind::Zip);
    }

    #[test]
    fn detect_rejects_plain_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, b"not an archive").unwrap();

        assert!(matches!(
            SourceRef::detect(&path),
            Err(SourceError::Unsupported { .. })
        ));
    }

    #[test]
    fn detect_rejects_missing_path() {
        assert!(matches!(
            SourceRef::detect(Path::new("/nonexistent/walls")),
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn entry_location_formats() {
        let archive = SourceRef::Archive {
            path: PathBuf::from("/walls.zip"),
        };
        assert_eq!(archive.entry_location("img/1.jpg"), "/walls.zip!/img/1.jpg");

        let folder = SourceRef::Directory {
            path: PathBuf::from("/walls"),
        };
        let location = folder.entry_location("nature/forest.png");
        assert!(location.ends_with("forest.png"));
        assert!(location.contains("nature"));
    }

    #[test]
    fn source_ref_serializes_with_type_tag() {
        let source = SourceRef::Archive {
            path: PathBuf::from("/walls.zip"),
        };
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"type\":\"archive\""));
    }
}
