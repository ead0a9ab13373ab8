use std::path::PathBuf;
use thiserror::Error;

use crate::persistence::PersistenceError;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the media-ingest library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// File could not be decoded as an image
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Thumbnail could not be produced
    #[error("Thumbnail generation failed: {0}")]
    Thumbnail(String),

    /// Catalog store failure
    #[error("Catalog error: {0}")]
    Persistence(#[from] PersistenceError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The run was cancelled before it started
    #[error("Operation cancelled")]
    Cancelled,
}
