//! Entry name filtering for image sources.

use std::collections::HashSet;

/// Extensions accepted as wallpaper candidates
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Decides which entries of a source are images worth fingerprinting.
///
/// Works on entry names rather than filesystem paths so the same rules apply
/// to files in a folder and to members of a ZIP archive.
#[derive(Debug, Clone)]
pub struct ImageFilter {
    extensions: HashSet<String>,
}

impl ImageFilter {
    /// Create a filter with the default extension allow-list
    pub fn new() -> Self {
        Self {
            extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Check whether an entry name has an accepted extension (case-insensitive)
    pub fn matches(&self, name: &str) -> bool {
        let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);

        match file_name.rsplit_once('.') {
            // ".png" on its own is a dotfile without an extension
            Some((stem, ext)) if !stem.is_empty() => {
                self.extensions.contains(&ext.to_ascii_lowercase())
            }
            _ => false,
        }
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
