/// Error types for load-time failures
///
/// Steady-state page turning never fails: rejected intents are silent and
/// missing photos render placeholders. These errors only surface while the
/// dataset, config file, or photographs are being loaded.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    /// The bundled dataset is not valid JSON for our records
    #[error("failed to parse content records: {0}")]
    ContentParse(#[source] serde_json::Error),

    /// Record ids must run 1, 2, 3, ... without gaps
    #[error("content record #{position} has id {found}, expected {expected}")]
    ContentId {
        position: usize,
        expected: u32,
        found: u32,
    },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("photo {file} not found under {dir}")]
    PhotoMissing { file: String, dir: PathBuf },

    #[error("failed to decode photo {path}: {source}")]
    PhotoDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("background task failed: {0}")]
    Join(String),

    /// No adapter, device loss, or a failed readback
    #[error("GPU error: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, BookError>;
