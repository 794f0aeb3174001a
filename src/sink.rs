use crate::error::OcrError;
use std::io::Write;
use std::path::PathBuf;

/// Where recognized text ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSink {
    Stdout,
    /// Plain-text file, overwritten if present
    File(PathBuf),
}

impl TextSink {
    pub fn from_output(output: Option<PathBuf>) -> Self {
        output.map_or(Self::Stdout, Self::File)
    }

    pub fn write(&self, text: &str) -> Result<(), OcrError> {
        match self {
            Self::Stdout => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", text)
                    .and_then(|_| stdout.flush())
                    .map_err(|e| OcrError::Internal(format!("Failed to write to stdout: {}", e)))
            }
            Self::File(path) => {
                std::fs::write(path, text).map_err(|e| {
                    OcrError::Internal(format!("Failed to write {:?}: {}", path, e))
                })?;
                tracing::info!("Wrote {} bytes of text to {:?}", text.len(), path);
                Ok(())
            }
        }
    }
}
