//! Decoding uploaded frames into RGB images.
//!
//! Frames arrive either as a browser data URL (`data:image/jpeg;base64,...`)
//! or as raw encoded bytes from a multipart upload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbImage;

use crate::error::{InferenceError, InferenceResult};

/// Decode a data URL. Everything after the first comma is base64 image data.
pub fn decode_data_url(data_url: &str) -> InferenceResult<RgbImage> {
    let (_, encoded) = data_url
        .split_once(',')
        .ok_or_else(|| InferenceError::decode("missing data URL header"))?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| InferenceError::decode(format!("invalid base64: {e}")))?;

    decode_bytes(&bytes)
}

/// Decode encoded image bytes (JPEG, PNG, ...) into 8-bit RGB.
pub fn decode_bytes(bytes: &[u8]) -> InferenceResult<RgbImage> {
    if bytes.is_empty() {
        return Err(InferenceError::decode("empty image"));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| InferenceError::decode(e.to_string()))?;

    Ok(image.to_rgb8())
}

/// Mirror a frame left-to-right, matching a selfie-view webcam.
pub fn mirror(frame: &RgbImage) -> RgbImage {
    image::imageops::flip_horizontal(frame)
}
