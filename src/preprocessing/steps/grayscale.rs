use crate::error::OcrError;
use image::{DynamicImage, Rgba};

/// ITU-R BT.709 luma weights
const RED_WEIGHT: f64 = 0.2126;
const GREEN_WEIGHT: f64 = 0.7152;
const BLUE_WEIGHT: f64 = 0.0722;

/// Weighted brightness of an RGB triple, rounded to the nearest level
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let l = RED_WEIGHT * f64::from(r) + GREEN_WEIGHT * f64::from(g) + BLUE_WEIGHT * f64::from(b);
    l.round().clamp(0.0, 255.0) as u8
}

/// Convert image to grayscale, keeping the RGBA layout
///
/// Every pixel becomes (L, L, L, A) where L is the BT.709 luminance and A
/// is the source alpha.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let rgba = image.into_rgba8();
    let gray = imageproc::map::map_colors(&rgba, |Rgba([r, g, b, a])| {
        let l = luminance(r, g, b);
        Rgba([l, l, l, a])
    });
    Ok(DynamicImage::ImageRgba8(gray))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, RgbaImage};

    #[test]
    fn test_luminance_primaries() {
        assert_eq!(luminance(255, 0, 0), 54);
        assert_eq!(luminance(0, 255, 0), 182);
        assert_eq!(luminance(0, 0, 255), 18);
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
    }

    #[test]
    fn test_luminance_is_identity_on_gray() {
        for v in 0..=255u8 {
            assert_eq!(luminance(v, v, v), v);
        }
    }

    #[test]
    fn test_grayscale_converts_color() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let result = apply(DynamicImage::ImageRgb8(img)).unwrap().to_rgba8();

        assert_eq!(result.get_pixel(0, 0), &Rgba([54, 54, 54, 255]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([182, 182, 182, 255]));
        assert_eq!(result.get_pixel(2, 0), &Rgba([18, 18, 18, 255]));
    }

    #[test]
    fn test_grayscale_keeps_alpha() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 255, 0, 128]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        let result = apply(DynamicImage::ImageRgba8(img)).unwrap().to_rgba8();

        assert_eq!(result.get_pixel(0, 0), &Rgba([182, 182, 182, 128]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = RgbImage::new(100, 50);
        let result = apply(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(result.width(), 100);
        assert_eq!(result.height(), 50);
    }
}
