//! Lazy enumeration of image entries inside a folder or ZIP archive.
//!
//! Both walkers read one entry at a time, so memory use is bounded by the
//! largest single image rather than the size of the source.

use super::{ImageFilter, SourceEntry, SourceRef};
use crate::error::SourceError;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Open a source for a single pass over its image entries.
///
/// Fails with a [`SourceError`] when the root itself cannot be opened.
/// Problems with individual entries are yielded as `Err` items instead so the
/// caller can skip them and keep going.
pub fn walk(source: &SourceRef) -> Result<SourceWalker, SourceError> {
    match source {
        SourceRef::Directory { path } => DirectoryWalker::open(path).map(SourceWalker::Directory),
        SourceRef::Archive { path } => ArchiveWalker::open(path).map(SourceWalker::Archive),
    }
}

/// Single-pass iterator over `(entry name, bytes)` pairs of a source
pub enum SourceWalker {
    Directory(DirectoryWalker),
    Archive(ArchiveWalker),
}

impl Iterator for SourceWalker {
    type Item = Result<SourceEntry, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SourceWalker::Directory(walker) => walker.next(),
            SourceWalker::Archive(walker) => walker.next(),
        }
    }
}

pub(super) fn open_error(path: &Path, error: io::Error) -> SourceError {
    match error.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => SourceError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => SourceError::ReadDirectory {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Recursive folder walker built on walkdir
pub struct DirectoryWalker {
    root: PathBuf,
    entries: walkdir::IntoIter,
    filter: ImageFilter,
}

impl DirectoryWalker {
    pub fn open(root: &Path) -> Result<Self, SourceError> {
        let metadata = fs::metadata(root).map_err(|e| open_error(root, e))?;
        if !metadata.is_dir() {
            return Err(SourceError::Unsupported {
                path: root.to_path_buf(),
            });
        }

        // Surface an unreadable root now instead of as the first entry error
        fs::read_dir(root).map_err(|e| open_error(root, e))?;

        // Sorted so a static folder is always indexed in the same order
        let entries = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Ok(Self {
            root: root.to_path_buf(),
            entries,
            filter: ImageFilter::new(),
        })
    }

    /// Path relative to the root with `/` separators
    fn entry_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Iterator for DirectoryWalker {
    type Item = Result<SourceEntry, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let entry = e
                        .path()
                        .map(|p| self.entry_name(p))
                        .unwrap_or_default();
                    return Some(Err(SourceError::ReadEntry {
                        entry,
                        reason: e.to_string(),
                    }));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = self.entry_name(entry.path());
            if !self.filter.matches(&name) {
                continue;
            }

            return Some(match fs::read(entry.path()) {
                Ok(content) => Ok(SourceEntry { name, content }),
                Err(e) => Err(SourceError::ReadEntry {
                    entry: name,
                    reason: e.to_string(),
                }),
            });
        }
    }
}

/// ZIP archive walker; yields members in central directory order
pub struct ArchiveWalker {
    archive: ZipArchive<BufReader<File>>,
    next_index: usize,
    filter: ImageFilter,
}

impl ArchiveWalker {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|e| open_error(path, e))?;
        let archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| SourceError::Archive {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            archive,
            next_index: 0,
            filter: ImageFilter::new(),
        })
    }
}

impl Iterator for ArchiveWalker {
    type Item = Result<SourceEntry, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;

            let mut member = match self.archive.by_index(index) {
                Ok(member) => member,
                Err(e) => {
                    return Some(Err(SourceError::ReadEntry {
                        entry: format!("#{}", index),
                        reason: e.to_string(),
                    }))
                }
            };

            if member.is_dir() {
                continue;
            }

            let name = member.name().to_string();
            if !self.filter.matches(&name) {
                continue;
            }

            let mut content = Vec::new();
            return Some(match member.read_to_end(&mut content) {
                Ok(_) => Ok(SourceEntry { name, content }),
                Err(e) => Err(SourceError::ReadEntry {
                    entry: name,
                    reason: e.to_string(),
                }),
            });
        }

        None
    }
}
