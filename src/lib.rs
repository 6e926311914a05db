//! # Wallpaper Finder
//!
//! Finds where the wallpaper currently on screen came from.
//!
//! A folder or ZIP archive of wallpapers is indexed once: every image gets a
//! 64-bit perceptual fingerprint stored in SQLite. Later, the active
//! wallpaper (often a re-encoded, rescaled copy) is fingerprinted the same
//! way and the collection image with the smallest Hamming distance is
//! reported.
//!
//! ## Architecture
//! - `core` - Fingerprinting, sources, the index, indexing and matching
//! - `events` - Channel-based progress reporting
//! - `settings` - Persisted source selection and refresh preferences
//! - `error` - Typed error hierarchy

pub mod core;
pub mod error;
pub mod events;
pub mod settings;

// Re-export commonly used types at the crate root
pub use error::{Result, WallpaperFinderError};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// Honors `RUST_LOG`; otherwise logs warnings only, or everything from this
/// crate at debug level when `verbose` is set. Calling it twice is a no-op.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "wallpaper_finder=debug,wallfind=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
