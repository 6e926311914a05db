//! Integration tests for nearest-match lookup.
//!
//! These tests verify end-to-end matching behavior including:
//! - Exact and near-duplicate references
//! - Empty and missing indexes
//! - Undecodable reference images

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wallpaper_finder::core::fingerprint::decode_file;
use wallpaper_finder::core::index::SqliteIndexStore;
use wallpaper_finder::core::indexer::Indexer;
use wallpaper_finder::core::matcher::Matcher;
use wallpaper_finder::core::source::SourceRef;

/// A 256x256 image made of 8x8 randomly shaded blocks
fn blocky_image(seed: u32) -> DynamicImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(17);
    let mut cells = [[0u8; 8]; 8];
    for row in cells.iter_mut() {
        for cell in row.iter_mut() {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            *cell = (state >> 16) as u8;
        }
    }

    let img = ImageBuffer::from_fn(256, 256, |x, y| {
        let v = cells[(y / 32) as usize][(x / 32) as usize];
        Rgb([v, v / 2, 255 - v])
    });
    DynamicImage::ImageRgb8(img)
}

fn solid(color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_pixel(10, 10, Rgb(color)))
}

/// Index `images` from a fresh folder; returns (workspace, matcher)
fn indexed(images: &[(&str, DynamicImage)]) -> (TempDir, Matcher) {
    let temp_dir = TempDir::new().unwrap();
    let walls = temp_dir.path().join("walls");
    std::fs::create_dir(&walls).unwrap();
    for (name, image) in images {
        image.save(walls.join(name)).unwrap();
    }

    let store = Arc::new(SqliteIndexStore::open_or_create(&temp_dir.path().join("index.db")).unwrap());
    Indexer::new(store.clone())
        .index(&SourceRef::detect(&walls).unwrap())
        .unwrap();

    (temp_dir, Matcher::new(store))
}

#[test]
fn red_and_blue_folder_matches_red_reference() {
    let (temp_dir, matcher) = indexed(&[
        ("a.png", solid([255, 0, 0])),
        ("b.png", solid([0, 0, 255])),
    ]);

    let reference = temp_dir.path().join("walls").join("a.png");
    let best = matcher.find_nearest_file(&reference).unwrap().unwrap();

    assert_eq!(best.record.entry_name, "a.png");
    assert_eq!(best.distance, 0);

    // With a.png out of the way the same reference lands on b.png, further away
    let (_blue_dir, blue_only) = indexed(&[("b.png", solid([0, 0, 255]))]);
    let fallback = blue_only.find_nearest_file(&reference).unwrap().unwrap();
    assert_eq!(fallback.record.entry_name, "b.png");
    assert!(best.distance < fallback.distance);
}

#[test]
fn every_indexed_image_finds_itself() {
    let images: Vec<_> = (0..5)
        .map(|seed| (format!("{seed}.png"), blocky_image(seed)))
        .collect();
    let named: Vec<_> = images
        .iter()
        .map(|(name, image)| (name.as_str(), image.clone()))
        .collect();
    let (_temp_dir, matcher) = indexed(&named);

    for (name, image) in &images {
        let best = matcher.find_nearest(image).unwrap().unwrap();
        assert_eq!(&best.record.entry_name, name);
        assert_eq!(best.distance, 0);
    }
}

#[test]
fn transcoded_rescaled_copy_finds_its_original() {
    let (temp_dir, matcher) = indexed(&[
        ("one.png", blocky_image(1)),
        ("two.png", blocky_image(2)),
        ("three.png", blocky_image(3)),
    ]);

    // What the desktop does to a wallpaper: rescale, then re-encode as JPEG
    let resized = blocky_image(2).resize_exact(200, 150, FilterType::Triangle);
    let mut jpeg = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    let reference = temp_dir.path().join("TranscodedWallpaper");
    std::fs::write(&reference, &jpeg).unwrap();

    let best = matcher.find_nearest_file(&reference).unwrap().unwrap();
    assert_eq!(best.record.entry_name, "two.png");

    let decoded = decode_file(&reference).unwrap();
    assert_eq!(decoded.width(), 200);
}

#[test]
fn empty_index_has_no_match() {
    let (_temp_dir, matcher) = indexed(&[]);
    assert!(matcher.find_nearest(&blocky_image(1)).unwrap().is_none());
}

#[test]
fn missing_index_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let error = SqliteIndexStore::open_existing(&temp_dir.path().join("absent.db"))
        .map_err(wallpaper_finder::WallpaperFinderError::from)
        .err()
        .unwrap();

    assert!(error.is_index_unavailable());
}

#[test]
fn unreadable_reference_is_decode_error() {
    let (temp_dir, matcher) = indexed(&[("a.png", blocky_image(1))]);

    let garbage = temp_dir.path().join("TranscodedWallpaper");
    std::fs::write(&garbage, b"not an image").unwrap();
    assert!(matcher.find_nearest_file(&garbage).unwrap_err().is_decode());

    let absent = Path::new("/nonexistent/TranscodedWallpaper");
    assert!(matcher.find_nearest_file(absent).unwrap_err().is_decode());
}
