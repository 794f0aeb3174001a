//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine with per-language training data. Uses the
//! tesseract-static crate for static linking (no system dependencies).
//! Language packs come from `tessdata_fast` and are downloaded on first use.

use crate::engine::{OcrEngine, OcrResult, RecognitionSession};
use crate::error::OcrError;
use crate::models;
use crate::preprocessing::EncodedImage;
use std::io::Cursor;
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// Languages advertised in `/info`; any other valid code is fetched on demand
const COMMON_LANGUAGES: &[&str] = &[
    "eng", "deu", "fra", "spa", "ita", "por", "nld", "jpn", "chi_sim", "chi_tra", "kor", "ara",
    "rus", "hin",
];

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Directory holding `<lang>.traineddata` files
    tessdata_dir: PathBuf,
}

impl LeptessEngine {
    /// Create the engine and make sure the default language pack is usable
    pub fn new(tessdata_path: Option<&str>, default_language: &str) -> Result<Self, OcrError> {
        let tessdata_dir = tessdata_path
            .map(PathBuf::from)
            .unwrap_or_else(|| models::cache_root().join("tessdata"));
        let engine = Self { tessdata_dir };

        // Probe the default pack once at startup
        let path = engine.ensure_language(default_language)?;
        let probe = Tesseract::new(Some(&path), Some(default_language)).map_err(|e| {
            OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(probe);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            path,
            default_language
        );

        Ok(engine)
    }

    /// Download `<language>.traineddata` if missing; returns the tessdata dir
    fn ensure_language(&self, language: &str) -> Result<String, OcrError> {
        let filename = format!("{}.traineddata", language);
        models::ensure_downloaded(&tessdata_url(language), &self.tessdata_dir, &filename)?;

        // Tesseract expects the directory, not the file
        self.tessdata_dir
            .to_str()
            .map(|s| s.to_string())
            .ok_or_else(|| OcrError::InitializationError("Invalid tessdata path".to_string()))
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - downloadable language packs, better for noisy photos"
    }

    fn supported_languages(&self) -> Vec<String> {
        COMMON_LANGUAGES.iter().map(|l| l.to_string()).collect()
    }

    fn supports_language(&self, language: &str) -> bool {
        is_valid_language_code(language)
    }

    fn load_language(
        &self,
        language: &str,
    ) -> Result<Box<dyn RecognitionSession + '_>, OcrError> {
        let tessdata_path = self.ensure_language(language)?;
        Ok(Box::new(LeptessSession {
            tessdata_path,
            language: language.to_string(),
            tess: None,
        }))
    }
}

struct LeptessSession {
    tessdata_path: String,
    language: String,
    tess: Option<Tesseract>,
}

impl RecognitionSession for LeptessSession {
    fn initialize(&mut self) -> Result<(), OcrError> {
        let tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language)).map_err(|e| {
            OcrError::InitializationError(format!(
                "Failed to initialize Tesseract for '{}': {}",
                self.language, e
            ))
        })?;
        self.tess = Some(tess);
        Ok(())
    }

    fn recognize(
        &mut self,
        image: &EncodedImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<OcrResult, OcrError> {
        let tess = self.tess.take().ok_or_else(|| {
            OcrError::ProcessingError("Tesseract session used before initialize".to_string())
        })?;

        // BMP is always supported by leptonica
        let rgb_img = image.decode()?.into_rgb8();
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to convert to BMP: {}", e)))?;

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            image.width,
            image.height,
            bmp_data.len()
        );

        let tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::ProcessingError(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                image.width,
                image.height,
                bmp_data.len(),
                e
            ))
        })?;
        progress(0.2);

        let mut tess = tess
            .recognize()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;
        progress(0.9);

        let text = tess
            .get_text()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to get text: {}", e)))?;

        // 0-100 scale from Tesseract
        let confidence = tess.mean_text_conf() as f32 / 100.0;
        self.tess = Some(tess);

        Ok(OcrResult {
            text,
            confidence: confidence.clamp(0.0, 1.0),
            warnings: Vec::new(),
        })
    }

    fn terminate(&mut self) {
        self.tess = None;
    }
}

/// Tesseract pack names: lowercase letters, optionally `_script` (e.g. `chi_sim`)
fn is_valid_language_code(language: &str) -> bool {
    let mut parts = language.split('_');
    let base = parts.next().unwrap_or_default();
    (3..=4).contains(&base.len())
        && base.chars().all(|c| c.is_ascii_lowercase())
        && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}
