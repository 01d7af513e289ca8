//! Image preprocessing for the classifier.
//!
//! The model consumes a fixed 256x256 RGB frame. Uploaded bytes are
//! decoded, converted to three channels and resized to exactly that
//! resolution; batching into a single-element tensor happens in the
//! classifier itself.

use image::imageops::FilterType;
use image::RgbImage;

use crate::error::ClassifyError;

/// Input width expected by the classifier.
pub const INPUT_WIDTH: u32 = 256;

/// Input height expected by the classifier.
pub const INPUT_HEIGHT: u32 = 256;

/// Decode uploaded bytes into the classifier's input frame.
///
/// Any decodable PNG/JPEG is accepted regardless of its original size or
/// color type; the aspect ratio is not preserved.
pub fn decode_and_resize(image_bytes: &[u8]) -> Result<RgbImage, ClassifyError> {
    let decoded =
        image::load_from_memory(image_bytes).map_err(|e| ClassifyError::Decode(e.to_string()))?;

    Ok(decoded
        .resize_exact(INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle)
        .to_rgb8())
}

// =============================================================================
// Tests
// =============================================================================
