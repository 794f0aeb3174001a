//! Image preprocessing module for OCR input
//!
//! Bounds the image width, converts to BT.709 grayscale and re-encodes the
//! result as PNG for the recognition engines.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PreprocessConfig, PreprocessingResult, Preset, StepTiming};
pub use steps::encode::EncodedImage;

use crate::error::OcrError;

/// Resize and grayscale `bytes`, returning a PNG-encoded image
///
/// `max_width` is validated before anything is decoded, so a bad bound is
/// reported as [`OcrError::InvalidConfig`] even for unreadable input.
pub fn preprocess(bytes: &[u8], max_width: i64) -> Result<EncodedImage, OcrError> {
    let config = PreprocessConfig::new(max_width)?;
    Pipeline::new(Preset::Default, config)
        .process(bytes)
        .map(|result| result.image)
}

/// [`preprocess`] on the blocking thread pool
pub async fn preprocess_async(bytes: Vec<u8>, max_width: i64) -> Result<EncodedImage, OcrError> {
    tokio::task::spawn_blocking(move || preprocess(&bytes, max_width))
        .await
        .map_err(|e| OcrError::Internal(format!("Preprocessing task failed: {}", e)))?
}
