//! Crate-wide error type.
//!
//! Only failures that abort a run live here. Per-file and per-cell problems
//! are reported through [`crate::Diagnostics`] instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// H3 resolution outside 0-15
    #[error("resolution must be between 0 and 15, got {0}")]
    InvalidResolution(u8),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    /// A required column is absent from the CSV header
    #[error("table is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "http")]
    #[error("Overpass API request timed out. Try a smaller query area.")]
    Timeout,

    #[cfg(feature = "http")]
    #[error("could not connect to Overpass API. Check your network connection.")]
    Connect,

    #[cfg(feature = "http")]
    #[error("Overpass API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("Overpass API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "persistence")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
