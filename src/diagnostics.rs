//! Recoverable problems collected during a run.
//!
//! A bad track file or an unconvertible cell never stops processing. Each one
//! becomes a [`Diagnostic`] that is logged at warn level and kept, so callers
//! (and tests) can inspect exactly what was skipped.

use std::fmt;
use std::path::PathBuf;

use log::warn;

/// A single skipped item.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Track file that could not be opened or decoded
    UnreadableTrack { path: PathBuf, reason: String },
    /// Sample whose coordinates could not be indexed
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        resolution: u8,
        reason: String,
    },
    /// Table cell that could not be turned into a polygon
    InvalidCell { cell: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnreadableTrack { path, reason } => {
                write!(f, "Could not parse {}: {}", path.display(), reason)
            }
            Diagnostic::InvalidCoordinate { latitude, longitude, resolution, reason } => write!(
                f,
                "Failed to convert coordinate to H3 cell: lat={}, lon={}, resolution={}, error={}",
                latitude, longitude, resolution, reason
            ),
            Diagnostic::InvalidCell { cell, reason } => write!(
                f,
                "Failed to convert H3 cell to polygon: cell_id={}, error={}",
                cell, reason
            ),
        }
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.records.push(diagnostic);
    }

    /// Append another collection without logging again.
    pub fn extend(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.records
    }
}
