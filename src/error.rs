use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Invalid preprocessing config: {0}")]
    InvalidConfig(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to process image: {0}")]
    ProcessingError(String),

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("Unsupported language '{language}' for engine '{engine}'")]
    UnsupportedLanguage { engine: String, language: String },

    #[error("Unknown OCR engine: {0}")]
    EngineNotFound(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Request body exceeds the upload limit of {max} bytes")]
    UploadTooLarge { max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Stable machine-readable code sent to HTTP clients
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::InvalidConfig(_) => "INVALID_CONFIG",
            OcrError::Decode(_) => "DECODE_ERROR",
            OcrError::InitializationError(_) => "INIT_ERROR",
            OcrError::ProcessingError(_) => "PROCESSING_ERROR",
            OcrError::PreprocessingError(_) => "PREPROCESSING_ERROR",
            OcrError::UnsupportedLanguage { .. } => "UNSUPPORTED_LANGUAGE",
            OcrError::EngineNotFound(_) => "ENGINE_NOT_FOUND",
            OcrError::ImageTooLarge { .. } | OcrError::UploadTooLarge { .. } => {
                "IMAGE_TOO_LARGE"
            }
            OcrError::MissingFile => "MISSING_FILE",
            OcrError::InvalidRequest(_) => "INVALID_REQUEST",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            OcrError::InvalidConfig(_)
            | OcrError::UnsupportedLanguage { .. }
            | OcrError::MissingFile
            | OcrError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OcrError::EngineNotFound(_) => StatusCode::NOT_FOUND,
            OcrError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OcrError::ImageTooLarge { .. } | OcrError::UploadTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            OcrError::InitializationError(_)
            | OcrError::ProcessingError(_)
            | OcrError::PreprocessingError(_)
            | OcrError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}
