//! # Fingerprint Module
//!
//! Computes the perceptual fingerprint used to compare wallpapers.
//!
//! ## How It Works
//! 1. Convert the image to grayscale (luminance)
//! 2. Resize to 32x32 with a Lanczos3 filter
//! 3. Apply a 2-D DCT
//! 4. Keep the top-left 8x8 low-frequency block, DC term included
//! 5. Set bit `i` when coefficient `i` is at or above the block median
//!
//! The parameters are fixed for the lifetime of the crate. Fingerprints made
//! with different parameters cannot be compared, so any change to them must
//! bump [`FINGERPRINT_VERSION`]; the index refuses to open a database stamped
//! with another version.
//!
//! ## Example
//! ```rust,ignore
//! use wallpaper_finder::core::fingerprint::PerceptualHasher;
//!
//! let hasher = PerceptualHasher::new();
//! let a = hasher.hash_bytes(&bytes_a, "a.png")?;
//! let b = hasher.hash_bytes(&bytes_b, "b.png")?;
//! println!("{} bits apart", a.distance(&b));
//! ```

mod dct;
mod decode;

pub use decode::{decode_bytes, decode_file};

use crate::error::DecodeError;
use dct::DctTable;
use image::imageops::{self, FilterType};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Side of the hash grid; the fingerprint has `HASH_SIZE * HASH_SIZE` bits
pub const HASH_SIZE: u32 = 8;

/// Side of the grayscale image fed to the DCT
pub const TRANSFORM_SIZE: u32 = 32;

/// Number of bits in a fingerprint
pub const FINGERPRINT_BITS: u32 = HASH_SIZE * HASH_SIZE;

/// Length of the canonical hex encoding
pub const FINGERPRINT_HEX_LEN: usize = (FINGERPRINT_BITS / 4) as usize;

/// Identifies the parameter set above. Stamped into every index database.
pub const FINGERPRINT_VERSION: i64 = 1;

/// A 64-bit perceptual fingerprint.
///
/// Bit 63 corresponds to the DC coefficient, the remaining bits follow the
/// 8x8 block in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(u64);

/// A stored fingerprint string that cannot be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFingerprintError {
    #[error("expected {expected} hex characters, found {found}")]
    Length { expected: usize, found: usize },

    #[error("invalid hex digit in {value:?}")]
    InvalidDigit { value: String },
}

impl Fingerprint {
    /// Wrap raw fingerprint bits
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// The raw fingerprint bits
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Hamming distance: number of differing bits (0..=64)
    pub fn distance(&self, other: &Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Similarity as a percentage (100 = identical bits)
    pub fn similarity(&self, other: &Self) -> f64 {
        (1.0 - self.distance(other) as f64 / FINGERPRINT_BITS as f64) * 100.0
    }

    /// Canonical lowercase, zero-padded hex encoding
    pub fn to_hex(&self) -> String {
        format!("{:0width$x}", self.0, width = FINGERPRINT_HEX_LEN)
    }

    /// Parse the canonical hex encoding (case-insensitive)
    pub fn from_hex(value: &str) -> Result<Self, ParseFingerprintError> {
        if value.len() != FINGERPRINT_HEX_LEN {
            return Err(ParseFingerprintError::Length {
                expected: FINGERPRINT_HEX_LEN,
                found: value.len(),
            });
        }

        // from_str_radix would also accept a leading sign
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseFingerprintError::InvalidDigit {
                value: value.to_string(),
            });
        }

        u64::from_str_radix(value, 16)
            .map(Self)
            .map_err(|_| ParseFingerprintError::InvalidDigit {
                value: value.to_string(),
            })
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ParseFingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_hex()
    }
}

/// DCT-based perceptual hasher with the crate's single parameter set
pub struct PerceptualHasher {
    table: DctTable,
}

impl PerceptualHasher {
    pub fn new() -> Self {
        Self {
            table: DctTable::new(TRANSFORM_SIZE as usize),
        }
    }

    /// Fingerprint an already decoded image
    pub fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, DecodeError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::EmptyImage);
        }

        let gray = image.to_luma8();
        let resized = imageops::resize(&gray, TRANSFORM_SIZE, TRANSFORM_SIZE, FilterType::Lanczos3);
        let pixels: Vec<f64> = resized.pixels().map(|p| p[0] as f64).collect();

        let coefficients = self.table.low_frequency(&pixels, HASH_SIZE as usize);
        let median = median(&coefficients);

        let bits = coefficients
            .iter()
            .fold(0u64, |acc, &c| (acc << 1) | u64::from(c >= median));

        Ok(Fingerprint(bits))
    }

    /// Decode and fingerprint raw image bytes
    pub fn hash_bytes(&self, bytes: &[u8], name: &str) -> Result<Fingerprint, DecodeError> {
        let image = decode_bytes(bytes, name)?;
        self.hash_image(&image)
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
