//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `SwError` through a
//! `#[from]` variant where core operations can fail underneath them.

use thiserror::Error;

/// The top-level error type for `sw-core`.
#[derive(Debug, Error)]
pub enum SwError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `sw-*` crates.
pub type SwResult<T> = Result<T, SwError>;
