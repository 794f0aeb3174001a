use crate::error::OcrError;
use serde::Serialize;
use std::str::FromStr;
use std::time::Instant;

use super::steps::{self, encode::EncodedImage};

/// Preprocessing preset names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Hand the source image to recognition as-is
    None,
    /// Steps: decode, resize, grayscale, encode
    #[default]
    Default,
}

impl Preset {
    /// Get the preset name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Default => "default",
        }
    }
}

impl FromStr for Preset {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "default" => Ok(Self::Default),
            other => Err(OcrError::InvalidRequest(format!(
                "Unknown preset '{}' (expected 'none' or 'default')",
                other
            ))),
        }
    }
}

/// Bounds for the resize step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessConfig {
    max_width: u32,
}

impl PreprocessConfig {
    pub const DEFAULT_MAX_WIDTH: u32 = 1600;

    /// Validate a caller-supplied width bound
    pub fn new(max_width: i64) -> Result<Self, OcrError> {
        if max_width <= 0 {
            return Err(OcrError::InvalidConfig(format!(
                "max_width must be a positive integer, got {}",
                max_width
            )));
        }
        let max_width = u32::try_from(max_width).map_err(|_| {
            OcrError::InvalidConfig(format!("max_width {} is out of range", max_width))
        })?;
        Ok(Self { max_width })
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_width: Self::DEFAULT_MAX_WIDTH,
        }
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Encoded image (not serialized)
    #[serde(skip)]
    pub image: EncodedImage,
    pub width: u32,
    pub height: u32,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Preset used
    pub preset: String,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline that applies steps based on preset
pub struct Pipeline {
    preset: Preset,
    config: PreprocessConfig,
}

impl Pipeline {
    pub fn new(preset: Preset, config: PreprocessConfig) -> Self {
        Self { preset, config }
    }

    /// Decode `bytes` and process them according to the configured preset
    pub fn process(&self, bytes: &[u8]) -> Result<PreprocessingResult, OcrError> {
        let start = Instant::now();
        let mut timings = Vec::new();

        // Every preset decodes
        let img = run_step("decode", bytes, &mut timings, steps::decode::apply)?;

        let image = match self.preset {
            Preset::None => EncodedImage::passthrough(bytes, &img)?,
            Preset::Default => {
                let max_width = self.config.max_width();
                let img = run_step("resize", img, &mut timings, |img| {
                    steps::resize::apply(img, max_width)
                })?;
                let img = run_step("grayscale", img, &mut timings, steps::grayscale::apply)?;
                run_step("encode", img, &mut timings, |img| steps::encode::apply(&img))?
            }
        };

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "Preprocessed with preset '{}' to {}x{} ({} bytes) in {}ms",
            self.preset.as_str(),
            image.width,
            image.height,
            image.len(),
            total_time_ms
        );

        Ok(PreprocessingResult {
            width: image.width,
            height: image.height,
            image,
            total_time_ms,
            preset: self.preset.as_str().to_string(),
            steps: timings,
        })
    }
}

fn run_step<T, U, F>(
    name: &str,
    input: T,
    timings: &mut Vec<StepTiming>,
    step_fn: F,
) -> Result<U, OcrError>
where
    F: FnOnce(T) -> Result<U, OcrError>,
{
    let step_start = Instant::now();
    let result = step_fn(input)?;
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    Ok(result)
}
