use crate::config::Config;
use crate::engine::{self, Progress};
use crate::engines::EngineRegistry;
use crate::preprocessing::{self, Pipeline, PreprocessConfig, Preset};
use crate::sink::TextSink;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "img2text")]
#[command(about = "Extract text from images: grayscale preprocessing plus OCR")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Default language for OCR (e.g., "eng", "deu", "fra")
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE", default_value = "eng")]
    pub default_language: String,

    /// Maximum file size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Default width bound for preprocessing; wider images are downscaled
    #[arg(long, env = "OCR_MAX_WIDTH", default_value = "1600", allow_negative_numbers = true)]
    pub max_width: i64,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (the default when no command is given)
    Serve,

    /// Resize and grayscale an image, writing the result as PNG
    Preprocess {
        /// Source image
        input: PathBuf,

        /// Destination PNG
        #[arg(short, long)]
        output: PathBuf,

        /// Width bound (falls back to --max-width before the command)
        #[arg(long, allow_negative_numbers = true)]
        max_width: Option<i64>,
    },

    /// Preprocess and recognize an image, writing the text to stdout or a file
    Recognize {
        /// Source image
        input: PathBuf,

        /// Language code passed to the engine
        #[arg(short, long)]
        language: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        max_width: Option<i64>,

        /// Preprocessing preset ("none" or "default")
        #[arg(long, default_value = "default")]
        preset: Preset,

        /// Engine name; defaults to the first compiled-in engine
        #[arg(long)]
        engine: Option<String>,

        /// Text file to write instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `img2text preprocess`
pub fn preprocess(input: &Path, output: &Path, max_width: i64) -> anyhow::Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    let encoded = preprocessing::preprocess(&bytes, max_width)?;

    std::fs::write(output, &encoded.data)
        .with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!(
        "Wrote {}x{} {} ({} bytes) to {:?}",
        encoded.width,
        encoded.height,
        encoded.mime_type(),
        encoded.len(),
        output
    );
    Ok(())
}

/// Options for `img2text recognize`
#[derive(Debug, Clone)]
pub struct RecognizeOptions {
    pub input: PathBuf,
    pub language: Option<String>,
    pub max_width: Option<i64>,
    pub preset: Preset,
    pub engine: Option<String>,
    pub output: Option<PathBuf>,
}

/// `img2text recognize`
pub fn recognize(config: &Config, options: RecognizeOptions) -> anyhow::Result<()> {
    let preprocess_config =
        PreprocessConfig::new(options.max_width.unwrap_or(config.default_max_width))?;
    let language = options
        .language
        .unwrap_or_else(|| config.default_language.clone());

    let bytes = std::fs::read(&options.input)
        .with_context(|| format!("Failed to read {:?}", options.input))?;
    let prepared = Pipeline::new(options.preset, preprocess_config).process(&bytes)?;
    tracing::info!(
        "Preprocessed {:?} to {}x{} in {}ms",
        options.input,
        prepared.width,
        prepared.height,
        prepared.total_time_ms
    );

    let registry = EngineRegistry::new(config)?;
    let ocr_engine = registry.resolve(options.engine.as_deref())?;

    let result = engine::recognize(
        ocr_engine.as_ref(),
        &prepared.image,
        &language,
        &mut log_progress,
    )?;

    for warning in &result.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!(
        "Recognized {} chars with {} (confidence {:.2})",
        result.text.len(),
        ocr_engine.name(),
        result.confidence
    );

    TextSink::from_output(options.output).write(&result.text)?;
    Ok(())
}

fn log_progress(progress: Progress) {
    tracing::info!("{}: {:.0}%", progress.status, progress.progress * 100.0);
}
