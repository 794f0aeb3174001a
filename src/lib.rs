//! img2text: bounded-width grayscale preprocessing and OCR behind an HTTP
//! server and a small CLI.

pub mod cli;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod models;
pub mod preprocessing;
pub mod server;
pub mod sink;

pub use engine::{OcrEngine, OcrResult, Progress, RecognitionSession, Worker};
pub use error::OcrError;
pub use preprocessing::{preprocess, preprocess_async, EncodedImage, PreprocessConfig};
