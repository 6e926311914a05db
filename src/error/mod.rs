//! # Error Module
//!
//! Typed failures for the wallpaper finder engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, entry names, what went wrong
//! - **Per-entry failures are recoverable** - a broken image inside a source
//!   is skipped; an unreachable source or index is surfaced to the caller

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum WallpaperFinderError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("Index unavailable: {0}")]
    Index(#[from] IndexError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Indexing was cancelled")]
    Cancelled,
}

impl WallpaperFinderError {
    /// The image source root could not be opened
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// The index could not be opened or read
    pub fn is_index_unavailable(&self) -> bool {
        matches!(self, Self::Index(e) if !matches!(e, IndexError::MalformedRecord { .. }))
    }

    /// An image (usually the reference image) could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Errors raised while turning bytes into a raster image
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode image {name}: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while opening or walking an image source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Not a folder or ZIP archive: {path}")]
    Unsupported { path: PathBuf },

    #[error("Failed to open archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single entry could not be read; the walk continues past it
    #[error("Failed to read entry {entry}: {reason}")]
    ReadEntry { entry: String, reason: String },
}

/// Errors raised by the fingerprint index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index database not found at {path}. Run `wallfind index <source>` first.")]
    Missing { path: PathBuf },

    #[error("Failed to open index database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Index query failed: {0}")]
    QueryFailed(String),

    #[error("Index corruption detected at {path}. Delete this file and index again.")]
    Corrupted { path: PathBuf },

    #[error(
        "Index at {path} was built with fingerprint version {found}, expected {expected}. \
         Delete this file and index again."
    )]
    IncompatibleFingerprint {
        path: PathBuf,
        found: i64,
        expected: i64,
    },

    /// A stored row cannot be turned back into a record; scans skip it
    #[error("Malformed index record {id}: {reason}")]
    MalformedRecord { id: i64, reason: String },
}

/// Errors raised while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not valid JSON: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, WallpaperFinderError>;
