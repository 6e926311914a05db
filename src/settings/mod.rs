//! # Settings Module
//!
//! Where the engine keeps its files, and the few user preferences that
//! survive restarts.
//!
//! ## Layout
//! ```text
//! <data dir>/WallpaperFinder/
//!   wallpaper_index.db   fingerprint index
//!   settings.json        selected source, auto-refresh preferences
//! ```

use crate::core::source::{SourceKind, SourceRef};
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the application data directory
pub const APP_DIR_NAME: &str = "WallpaperFinder";

/// Default auto-refresh interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Shortest accepted auto-refresh interval in seconds
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Filesystem locations used by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub settings_path: PathBuf,
}

impl AppPaths {
    /// Lay out the application files under `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            db_path: data_dir.join("wallpaper_index.db"),
            settings_path: data_dir.join("settings.json"),
            data_dir,
        }
    }

    /// Platform data directory, falling back to the working directory
    pub fn platform_default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(APP_DIR_NAME))
    }

    /// Where the desktop keeps its copy of the wallpaper currently shown.
    ///
    /// Only Windows exposes one at a fixed location.
    pub fn active_wallpaper() -> Option<PathBuf> {
        if cfg!(windows) {
            dirs::config_dir().map(|roaming| {
                roaming
                    .join("Microsoft")
                    .join("Windows")
                    .join("Themes")
                    .join("TranscodedWallpaper")
            })
        } else {
            None
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Kind of the selected source
    pub source_type: Option<SourceKind>,
    /// Path of the selected source
    pub source_path: Option<PathBuf>,
    /// Re-run matching periodically
    pub auto_refresh: bool,
    /// Seconds between automatic matches
    pub interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_type: None,
            source_path: None,
            auto_refresh: false,
            interval: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl Settings {
    /// Load settings; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut settings: Settings =
            serde_json::from_str(&text).map_err(|e| SettingsError::Invalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        settings.interval = settings.interval.max(MIN_INTERVAL_SECS);
        Ok(settings)
    }

    /// Save settings as pretty JSON, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let write_error = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(write_error)
    }

    /// The selected source, when both its kind and path are set
    pub fn source(&self) -> Option<SourceRef> {
        let kind = self.source_type?;
        let path = self.source_path.clone()?;
        SourceRef::from_parts(kind.as_str(), path)
    }

    /// Replace the selected source
    pub fn set_source(&mut self, source: &SourceRef) {
        self.source_type = Some(source.kind());
        self.source_path = Some(source.path().to_path_buf());
    }

    /// Set the auto-refresh interval, clamped to the minimum
    pub fn set_interval(&mut self, seconds: u64) {
        self.interval = seconds.max(MIN_INTERVAL_SECS);
    }
}
