//! Download-once cache for engine data files (ocrs models, tessdata packs)

use crate::error::OcrError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upper bound for a single downloaded file
const MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Root of the on-disk cache, e.g. `~/.cache/img2text`
pub fn cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("img2text")
}

/// Make sure `dir/filename` exists, fetching it from `url` if it doesn't
pub fn ensure_downloaded(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, OcrError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        OcrError::InitializationError(format!(
            "Failed to create cache directory {:?}: {}",
            dir, e
        ))
    })?;

    let path = dir.join(filename);
    if path.exists() {
        tracing::info!("Using cached {} from {:?}", filename, path);
        return Ok(path);
    }

    tracing::info!("Downloading {} (this may take a moment)...", filename);
    download_file(url, &path)?;
    tracing::info!("Downloaded {} to {:?}", filename, path);

    Ok(path)
}

/// Download a file from URL to path using ureq
///
/// The body lands in a `.part` file and is renamed into place once complete.
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let mut response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download {}: {}", url, e)))?;

    let buffer = response
        .body_mut()
        .with_config()
        .limit(MAX_DOWNLOAD_BYTES)
        .read_to_vec()
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to read response body: {}", e))
        })?;

    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create {:?}: {}", partial, e))
    })?;
    file.write_all(&buffer)
        .map_err(|e| OcrError::InitializationError(format!("Failed to write {:?}: {}", partial, e)))?;

    std::fs::rename(&partial, path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to move {:?} into place: {}", path, e))
    })
}
