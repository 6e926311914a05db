//! Raster decoding from in-memory bytes.
//!
//! Entries come out of folders and ZIP archives as byte buffers, so the
//! decoder works on bytes and sniffs the format from the content rather
//! than trusting the entry's extension. JPEG goes through zune-jpeg
//! (1.5-2x faster), everything else through the image crate.

use crate::error::DecodeError;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode an image from a file on disk.
///
/// Used for the reference image, which has no reliable extension
/// (the Windows wallpaper cache file has none at all).
pub fn decode_file(path: &Path) -> Result<DynamicImage, DecodeError> {
    let bytes = fs::read(path).map_err(|e| DecodeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    decode_bytes(&bytes, &path.display().to_string())
}

/// Decode an image from raw bytes. `name` is only used in error messages.
pub fn decode_bytes(bytes: &[u8], name: &str) -> Result<DynamicImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Unreadable {
            name: name.to_string(),
            reason: "file is empty".to_string(),
        });
    }

    let format = image::guess_format(bytes).map_err(|e| DecodeError::Unreadable {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let image = match format {
        ImageFormat::Jpeg => decode_jpeg(bytes, name).or_else(|_| decode_fallback(bytes, name))?,
        _ => decode_fallback(bytes, name)?,
    };

    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::EmptyImage);
    }

    Ok(image)
}

/// Fast JPEG decoding using zune-jpeg
fn decode_jpeg(bytes: &[u8], name: &str) -> Result<DynamicImage, DecodeError> {
    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);

    let pixels = decoder.decode().map_err(|e| DecodeError::Unreadable {
        name: name.to_string(),
        reason: format!("zune-jpeg decode failed: {:?}", e),
    })?;

    let info = decoder.info().ok_or_else(|| DecodeError::Unreadable {
        name: name.to_string(),
        reason: "Failed to get image info".to_string(),
    })?;

    let width = info.width as u32;
    let height = info.height as u32;

    let buffer_error = |kind: &str| DecodeError::Unreadable {
        name: name.to_string(),
        reason: format!("Failed to create {} buffer", kind),
    };

    let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

    let image = match out_colorspace {
        ColorSpace::RGB => {
            let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGB"))?;
            DynamicImage::ImageRgb8(buffer)
        }
        ColorSpace::RGBA => {
            let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("RGBA"))?;
            DynamicImage::ImageRgba8(buffer)
        }
        ColorSpace::Luma => {
            let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| buffer_error("Luma"))?;
            DynamicImage::ImageLuma8(buffer)
        }
        _ => return decode_fallback(bytes, name),
    };

    Ok(image)
}

fn decode_fallback(bytes: &[u8], name: &str) -> Result<DynamicImage, DecodeError> {
    image::load_from_memory(bytes).map_err(|e| DecodeError::Unreadable {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(24, 16, |x, y| {
            Rgb([(x * 10) as u8, (y * 15) as u8, 90])
        }))
    }

    #[test]
    fn decodes_png_bytes() {
        let bytes = encode(&sample_image(), ImageFormat::Png);
        let decoded = decode_bytes(&bytes, "sample.png").unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 16));
    }

    #[test]
    fn decodes_jpeg_bytes() {
        let bytes = encode(&sample_image(), ImageFormat::Jpeg);
        let decoded = decode_bytes(&bytes, "sample.jpg").unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 16));
    }

    #[test]
    fn format_is_sniffed_not_taken_from_name() {
        let bytes = encode(&sample_image(), ImageFormat::Png);
        assert!(decode_bytes(&bytes, "mislabelled.jpg").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        let result = decode_bytes(b"this is not a valid image file", "notes.png");
        assert!(matches!(result, Err(DecodeError::Unreadable { .. })));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(decode_bytes(&[], "empty.png").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = decode_file(Path::new("/nonexistent/wallpaper/cache"));
        assert!(matches!(result, Err(DecodeError::Io { .. })));
    }
}
