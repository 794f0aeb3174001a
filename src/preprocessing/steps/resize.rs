use crate::error::OcrError;
use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Bilinear resampling; the kernel is fixed so output is reproducible
const FILTER: FilterType = FilterType::Triangle;

/// Compute the output size for an image bounded by `max_width`
///
/// The scale factor is `min(1, max_width / width)` and is shared by both
/// axes, but each axis is rounded on its own (half away from zero). That can
/// drift the aspect ratio by up to half a pixel per axis. Dimensions never
/// drop below 1.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    let scale = (f64::from(max_width) / f64::from(width)).min(1.0);

    let target_width = (f64::from(width) * scale).round() as u32;
    let target_height = (f64::from(height) * scale).round() as u32;

    (target_width.max(1), target_height.max(1))
}

/// Downscale an image so its width fits `max_width`
/// Images already narrow enough are returned untouched (no upscaling)
pub fn apply(image: DynamicImage, max_width: u32) -> Result<DynamicImage, OcrError> {
    if max_width == 0 {
        return Err(OcrError::InvalidConfig(
            "max_width must be a positive integer".to_string(),
        ));
    }

    let (width, height) = image.dimensions();
    let (target_width, target_height) = target_dimensions(width, height, max_width);

    if (target_width, target_height) == (width, height) {
        return Ok(image);
    }

    tracing::debug!(
        "Resizing {}x{} -> {}x{}",
        width,
        height,
        target_width,
        target_height
    );

    Ok(image.resize_exact(target_width, target_height, FILTER))
}
