//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use crate::engine::{OcrEngine, OcrResult, RecognitionSession};
use crate::engines::confidence;
use crate::error::OcrError;
use crate::models;
use crate::preprocessing::EncodedImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Load the detection and recognition models, downloading them if needed
    pub fn new() -> Result<Self, OcrError> {
        tracing::info!("Initializing ocrs OCR engine...");

        let cache_dir = models::cache_root().join("ocrs");
        let detection_model_path =
            models::ensure_downloaded(DETECTION_MODEL_URL, &cache_dir, "text-detection.rten")?;
        let recognition_model_path =
            models::ensure_downloaded(RECOGNITION_MODEL_URL, &cache_dir, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self { engine })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn supported_languages(&self) -> Vec<String> {
        // ocrs currently only supports English/Latin alphabet
        vec!["eng".to_string()]
    }

    fn load_language(
        &self,
        _language: &str,
    ) -> Result<Box<dyn RecognitionSession + '_>, OcrError> {
        // Models are shared by every session; there is nothing per-language to load
        Ok(Box::new(OcrsSession {
            engine: &self.engine,
            ready: false,
        }))
    }
}

/// Borrowed view of the loaded models for one recognition run
struct OcrsSession<'e> {
    engine: &'e OcrsOcrEngine,
    ready: bool,
}

impl RecognitionSession for OcrsSession<'_> {
    fn initialize(&mut self) -> Result<(), OcrError> {
        self.ready = true;
        Ok(())
    }

    fn recognize(
        &mut self,
        image: &EncodedImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<OcrResult, OcrError> {
        if !self.ready {
            return Err(OcrError::ProcessingError(
                "ocrs session used before initialize".to_string(),
            ));
        }

        // HWC RGB8 is what ImageSource::from_bytes expects
        let rgb_img = image.decode()?.into_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to prepare input: {}", e)))?;
        progress(0.1);

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to detect words: {}", e)))?;
        progress(0.4);

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);
        progress(0.5);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;
        progress(0.9);

        let text = line_texts
            .iter()
            .flatten()
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut warnings = Vec::new();
        if text.trim().is_empty() {
            warnings.push("No text detected in image".to_string());
        }

        Ok(OcrResult {
            confidence: confidence::score(&text),
            text,
            warnings,
        })
    }

    fn terminate(&mut self) {
        self.ready = false;
    }
}
