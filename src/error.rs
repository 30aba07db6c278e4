//! Error types shared by the parsers and source adapters.

use thiserror::Error;

/// Fatal error for a single decode attempt.
///
/// Callers are expected to recover by trying another producer (see
/// [`crate::source::decode_first`]) or by surfacing an error state.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// The interchange document has no recognizable root structure.
    #[error("format error: {0}")]
    Format(String),

    /// Decoded model JSON lacks a required top-level field.
    #[error("structure error: {0}")]
    Structure(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Compressed interchange container could not be unpacked.
    #[error("archive error: {0}")]
    Archive(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
