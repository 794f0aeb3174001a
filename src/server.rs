use crate::config::Config;
use crate::engine::{recognize, Progress};
use crate::engines::{EngineInfo, EngineRegistry};
use crate::error::OcrError;
use crate::preprocessing::{Pipeline, PreprocessConfig, PreprocessingResult, Preset};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(registry: EngineRegistry, config: Config) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}

/// OCR response
#[derive(Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub confidence: f32,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
    pub engine: String,
    pub language: String,
    pub preprocessing: PreprocessingResult,
    pub progress: Vec<Progress>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub default_engine: String,
    pub available_engines: Vec<EngineInfo>,
    pub max_file_size_bytes: usize,
    pub default_language: String,
    pub default_max_width: i64,
}

/// Build the router without binding a listener
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/ocr", post(handle_ocr))
        .route("/ocr/:engine", post(handle_ocr_with_engine))
        .route("/preprocess", post(handle_preprocess))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = EngineRegistry::new(&config)?;
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Available engines: {}", registry.list().join(", "));

    let app = router(AppState::new(registry, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Fields accepted by `/ocr` and `/preprocess`
#[derive(Default)]
struct UploadForm {
    file: Option<Bytes>,
    content_type: Option<String>,
    language: Option<String>,
    max_width: Option<String>,
    preset: Option<String>,
}

async fn read_form(
    mut multipart: Multipart,
    config: &Config,
) -> Result<UploadForm, OcrError> {
    let mut form = UploadForm::default();
    let max = config.max_file_size;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to parse multipart", max))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                form.content_type = field.content_type().map(|s| s.to_string());
                form.file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, "Failed to read file data", max))?,
                );
            }
            "language" | "languages" | "max_width" | "preset" => {
                let context = format!("Invalid {} field", name);
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, &context, max))?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match name.as_str() {
                    "max_width" => form.max_width = value,
                    "preset" => form.preset = value,
                    _ => form.language = value,
                }
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(form)
}

/// The body limit surfaces as a multipart stream error; keep it a 413
fn multipart_error(e: MultipartError, context: &str, max: usize) -> OcrError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        OcrError::UploadTooLarge { max }
    } else {
        OcrError::InvalidRequest(format!("{}: {}", context, e))
    }
}

impl UploadForm {
    /// Take the uploaded bytes, enforcing presence and the size limit
    fn take_file(&mut self, config: &Config) -> Result<Bytes, OcrError> {
        let data = self.file.take().ok_or(OcrError::MissingFile)?;

        if data.len() > config.max_file_size {
            return Err(OcrError::ImageTooLarge {
                size: data.len(),
                max: config.max_file_size,
            });
        }

        // Type filtering is left to the decoder; only note odd uploads
        if let Some(mime) = &self.content_type {
            if !mime.starts_with("image/") && mime != "application/octet-stream" {
                tracing::warn!("Received file with content type: {}", mime);
            }
        }

        Ok(data)
    }

    fn preprocess_config(&self, config: &Config) -> Result<PreprocessConfig, OcrError> {
        let max_width = match &self.max_width {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                OcrError::InvalidConfig(format!("max_width must be an integer, got '{}'", raw))
            })?,
            None => config.default_max_width,
        };
        PreprocessConfig::new(max_width)
    }

    fn preset(&self) -> Result<Preset, OcrError> {
        self.preset
            .as_deref()
            .map_or(Ok(Preset::default()), |s| s.parse())
    }
}

/// Handle OCR requests with the default engine
async fn handle_ocr(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    process_ocr(state, None, multipart).await
}

/// Handle OCR requests for a named engine
async fn handle_ocr_with_engine(
    State(state): State<AppState>,
    Path(engine): Path<String>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    process_ocr(state, Some(engine), multipart).await
}

async fn process_ocr(
    state: AppState,
    engine_name: Option<String>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    let start = Instant::now();

    let engine = state.registry.resolve(engine_name.as_deref())?;
    let mut form = read_form(multipart, &state.config).await?;
    let data = form.take_file(&state.config)?;
    let preprocess_config = form.preprocess_config(&state.config)?;
    let preset = form.preset()?;
    let language = form
        .language
        .take()
        .unwrap_or_else(|| state.config.default_language.clone());

    if !engine.supports_language(&language) {
        return Err(OcrError::UnsupportedLanguage {
            engine: engine.name().to_string(),
            language,
        });
    }

    let worker_engine = engine.clone();
    let worker_language = language.clone();
    let (preprocessing, result, progress) = tokio::task::spawn_blocking(move || {
        let prepared = Pipeline::new(preset, preprocess_config).process(&data)?;

        let mut events = Vec::new();
        let result = recognize(
            worker_engine.as_ref(),
            &prepared.image,
            &worker_language,
            &mut |p| {
                tracing::debug!("{}: {:.2}", p.status, p.progress);
                events.push(p);
            },
        )?;

        Ok::<_, OcrError>((prepared, result, events))
    })
    .await
    .map_err(|e| OcrError::Internal(format!("OCR task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "OCR completed in {}ms (engine: {}, language: {}), confidence: {:.2}, text length: {}",
        processing_time_ms,
        engine.name(),
        language,
        result.confidence,
        result.text.len()
    );

    Ok(Json(OcrResponse {
        text: result.text,
        confidence: result.confidence,
        processing_time_ms,
        warnings: result.warnings,
        engine: engine.name().to_string(),
        language,
        preprocessing,
        progress,
    }))
}

/// Handle preprocessing-only requests; responds with the PNG itself
async fn handle_preprocess(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, OcrError> {
    let mut form = read_form(multipart, &state.config).await?;
    let data = form.take_file(&state.config)?;
    let preprocess_config = form.preprocess_config(&state.config)?;

    let prepared = tokio::task::spawn_blocking(move || {
        Pipeline::new(Preset::Default, preprocess_config).process(&data)
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Preprocessing task failed: {}", e)))??;

    tracing::info!(
        "Preprocessed image to {}x{} in {}ms",
        prepared.width,
        prepared.height,
        prepared.total_time_ms
    );

    let image = prepared.image;
    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(image.mime_type()),
        ),
        (
            HeaderName::from_static("x-image-width"),
            HeaderValue::from(image.width),
        ),
        (
            HeaderName::from_static("x-image-height"),
            HeaderValue::from(image.height),
        ),
    ];

    Ok((headers, image.data).into_response())
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_engine: state.registry.default_name().to_string(),
        available_engines: state.registry.info(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.default_language.clone(),
        default_max_width: state.config.default_max_width,
    })
}
