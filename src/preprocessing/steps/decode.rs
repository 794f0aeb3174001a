use crate::error::OcrError;
use image::{DynamicImage, GenericImageView};

/// Decode raw bytes into an addressable pixel buffer
///
/// The format is sniffed from the content, so callers don't need to pass a
/// MIME type or file extension along.
pub fn apply(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    let image = image::load_from_memory(bytes).map_err(|e| OcrError::Decode(e.to_string()))?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(OcrError::Decode(format!(
            "image has no pixels ({}x{})",
            width, height
        )));
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_decode_png() {
        let img = RgbaImage::from_pixel(7, 3, Rgba([1, 2, 3, 4]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = apply(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (7, 3));
        assert_eq!(decoded.to_rgba8().get_pixel(6, 2), &Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = apply(b"definitely not an image").unwrap_err();
        assert!(matches!(err, OcrError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let img = RgbaImage::new(32, 32);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes.truncate(bytes.len() / 2);

        assert!(matches!(apply(&bytes), Err(OcrError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert!(matches!(apply(&[]), Err(OcrError::Decode(_))));
    }
}
