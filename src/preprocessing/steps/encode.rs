use crate::error::OcrError;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// A serialized raster image ready to hand to a recognition engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

impl EncodedImage {
    /// Wrap the untouched source bytes of an already decoded image
    pub fn passthrough(bytes: &[u8], decoded: &DynamicImage) -> Result<Self, OcrError> {
        let format = image::guess_format(bytes).map_err(|e| OcrError::Decode(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        Ok(Self {
            width,
            height,
            format,
            data: bytes.to_vec(),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Decode back into pixels (engines that need a raw buffer use this)
    pub fn decode(&self) -> Result<DynamicImage, OcrError> {
        image::load_from_memory_with_format(&self.data, self.format)
            .map_err(|e| OcrError::Decode(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Encode the processed buffer as PNG
pub fn apply(image: &DynamicImage) -> Result<EncodedImage, OcrError> {
    let (width, height) = image.dimensions();
    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
        .map_err(|e| OcrError::PreprocessingError(format!("Failed to encode PNG: {}", e)))?;

    Ok(EncodedImage {
        width,
        height,
        format: ImageFormat::Png,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_encode_produces_png() {
        let img = RgbaImage::from_pixel(5, 4, Rgba([9, 9, 9, 200]));
        let encoded = apply(&DynamicImage::ImageRgba8(img.clone())).unwrap();

        assert_eq!((encoded.width, encoded.height), (5, 4));
        assert_eq!(encoded.mime_type(), "image/png");
        assert_eq!(&encoded.data[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(encoded.decode().unwrap().to_rgba8(), img);
    }

    #[test]
    fn test_passthrough_keeps_source_bytes() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(3, 2));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Bmp)
            .unwrap();

        let encoded = EncodedImage::passthrough(&bytes, &img).unwrap();
        assert_eq!(encoded.format, ImageFormat::Bmp);
        assert_eq!(encoded.data, bytes);
        assert_eq!((encoded.width, encoded.height), (3, 2));
    }
}
