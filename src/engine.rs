use crate::error::OcrError;
use crate::preprocessing::EncodedImage;
use serde::Serialize;

/// Lifecycle stages reported while a worker runs
pub mod status {
    /// First event of every worker; engines themselves are built by the registry
    pub const LOADING_ENGINE: &str = "loading engine";
    pub const LOADING_LANGUAGE: &str = "loading language";
    pub const INITIALIZING: &str = "initializing api";
    pub const RECOGNIZING: &str = "recognizing text";
    pub const DONE: &str = "done";
}

/// A progress event: a lifecycle stage and how far along it is (0..=1)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub status: String,
    pub progress: f32,
}

impl Progress {
    pub fn new(status: &str, progress: f32) -> Self {
        Self {
            status: status.to_string(),
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

/// OCR processing result
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

/// One loaded engine+language pair
pub trait RecognitionSession {
    /// Prepare the session for recognition
    fn initialize(&mut self) -> Result<(), OcrError>;

    /// Recognize text, reporting fractional progress through `progress`
    fn recognize(
        &mut self,
        image: &EncodedImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<OcrResult, OcrError>;

    /// Release whatever the session holds. Called exactly once by [`Worker`].
    fn terminate(&mut self);
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Get supported languages (three-letter codes)
    fn supported_languages(&self) -> Vec<String>;

    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages().iter().any(|l| l == language)
    }

    /// Load language data and hand back an uninitialized session
    fn load_language(&self, language: &str)
        -> Result<Box<dyn RecognitionSession + '_>, OcrError>;
}

/// Scoped recognition worker
///
/// Holds a session from language load until drop; the session is terminated
/// on every exit path, including errors in `initialize` or `recognize`.
pub struct Worker<'e> {
    session: Box<dyn RecognitionSession + 'e>,
    engine: &'static str,
    language: String,
}

impl<'e> Worker<'e> {
    /// Load and initialize a worker for `language`
    pub fn start(
        engine: &'e dyn OcrEngine,
        language: &str,
        report: &mut dyn FnMut(Progress),
    ) -> Result<Self, OcrError> {
        if !engine.supports_language(language) {
            return Err(OcrError::UnsupportedLanguage {
                engine: engine.name().to_string(),
                language: language.to_string(),
            });
        }

        // Marks the start of the worker lifecycle, not engine construction
        report(Progress::new(status::LOADING_ENGINE, 0.0));
        report(Progress::new(status::LOADING_LANGUAGE, 0.0));
        let session = engine.load_language(language)?;

        let mut worker = Self {
            session,
            engine: engine.name(),
            language: language.to_string(),
        };
        tracing::debug!("Worker started ({}, {})", worker.engine, worker.language);

        report(Progress::new(status::INITIALIZING, 0.0));
        worker.session.initialize()?;

        Ok(worker)
    }

    pub fn recognize(
        &mut self,
        image: &EncodedImage,
        report: &mut dyn FnMut(Progress),
    ) -> Result<OcrResult, OcrError> {
        report(Progress::new(status::RECOGNIZING, 0.0));
        let mut result = self
            .session
            .recognize(image, &mut |p| report(Progress::new(status::RECOGNIZING, p)))?;
        report(Progress::new(status::RECOGNIZING, 1.0));

        let trimmed = result.text.trim();
        if trimmed.len() != result.text.len() {
            result.text = trimmed.to_string();
        }
        Ok(result)
    }
}

impl Drop for Worker<'_> {
    fn drop(&mut self) {
        self.session.terminate();
        tracing::debug!("Worker terminated ({}, {})", self.engine, self.language);
    }
}

/// Run a full load -> initialize -> recognize -> terminate cycle
pub fn recognize(
    engine: &dyn OcrEngine,
    image: &EncodedImage,
    language: &str,
    report: &mut dyn FnMut(Progress),
) -> Result<OcrResult, OcrError> {
    let result = {
        let mut worker = Worker::start(engine, language, report)?;
        worker.recognize(image, report)?
    };
    report(Progress::new(status::DONE, 1.0));
    Ok(result)
}
