//! # Route Heatmap
//!
//! GPS track visit heatmaps on H3 cells, plus OpenStreetMap extracts for a
//! skating map.
//!
//! This library provides:
//! - FIT track reading into GPS samples
//! - H3 cell indexing and per-file visit aggregation
//! - CSV persistence of visit counts and GeoJSON polygon export
//! - Overpass API fetching of ways and points of interest
//! - SQLite storage of fetched ways
//!
//! ## Features
//!
//! - **`parallel`** - Process track files in parallel with rayon
//! - **`http`** - Enable the Overpass API client
//! - **`persistence`** - Enable the SQLite way store
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use route_heatmap::{AggregateConfig, Diagnostics, Sample, visits_from_samples};
//!
//! let samples = vec![
//!     Sample::new(41.3874, 2.1686, "generic"),
//!     Sample::new(41.3874, 2.1686, "generic"),
//! ];
//!
//! let config = AggregateConfig::default();
//! let mut diagnostics = Diagnostics::new();
//! let visits = visits_from_samples(&samples, &config, &mut diagnostics);
//!
//! // Both samples fall in one cell, and one file counts as one visit
//! assert_eq!(visits.len(), 1);
//! assert_eq!(visits.most_common()[0].count, 1);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod diagnostics;
pub use diagnostics::{Diagnostic, Diagnostics};

// Track decoding
pub mod track;
pub use track::{find_track_files, read_track};

// H3 indexing
pub mod cells;
pub use cells::{cell_for, cell_polygon, index_samples, CellError, CellResolution};

// Visit counting
pub mod aggregate;
pub use aggregate::{
    AggregateConfig, AggregateResult, TrackSummary, VisitCounts, VisitRecord,
    aggregate_folder, aggregate_tracks, process_track, visits_from_samples,
};

#[cfg(feature = "parallel")]
pub use aggregate::aggregate_tracks_parallel;

// CSV table of visit counts
pub mod table;
pub use table::{LoadedTable, TableRow, read_table, read_table_file, write_table, write_table_file};

// GeoJSON heatmap export
pub mod export;
pub use export::{ExportConfig, cell_totals, export_polygons, write_geojson};

// OpenStreetMap data from the Overpass API
pub mod osm;
pub use osm::{Element, ElementKind, LatLon, OverpassResponse};

pub mod overpass;

pub mod pois;
pub use pois::{PoiKind, drinking_water_to_geojson, skate_pois_to_geojson};

#[cfg(feature = "persistence")]
pub mod ways;

#[cfg(feature = "persistence")]
pub use ways::WayStore;

// ============================================================================
// Core Types
// ============================================================================

/// Activity label used when a track record carries none.
pub const UNKNOWN_ACTIVITY: &str = "unknown";

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_heatmap::GpsPoint;
/// let point = GpsPoint::new(41.3874, 2.1686); // Barcelona
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True when latitude is within ±90 and longitude within ±180 (NaN fails both).
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One GPS fix read from a track, tagged with the activity it was recorded in.
///
/// Samples only live for the duration of a single file: they are indexed into
/// cells and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub point: GpsPoint,
    /// Activity label, e.g. "generic" or "running"
    pub activity_type: String,
}

impl Sample {
    /// Create a new sample.
    pub fn new(latitude: f64, longitude: f64, activity_type: impl Into<String>) -> Self {
        Self {
            point: GpsPoint::new(latitude, longitude),
            activity_type: activity_type.into(),
        }
    }
}

/// Optional allow-list of activity labels.
///
/// An empty list means "no filtering", so `--activity-type` without values and
/// no flag at all behave the same.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    allowed: Option<std::collections::HashSet<String>>,
}

impl ActivityFilter {
    /// A filter that accepts every label.
    pub fn any() -> Self {
        Self::default()
    }

    /// Build a filter from a list of labels.
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: std::collections::HashSet<String> = types.into_iter().map(Into::into).collect();
        if allowed.is_empty() {
            Self { allowed: None }
        } else {
            Self { allowed: Some(allowed) }
        }
    }

    /// True if a label list was given.
    pub fn is_active(&self) -> bool {
        self.allowed.is_some()
    }

    /// Check if a label passes the filter.
    pub fn allows(&self, activity_type: &str) -> bool {
        match &self.allowed {
            Some(allowed) => allowed.contains(activity_type),
            None => true,
        }
    }

    /// Allowed labels in sorted order, for display.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .allowed
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        labels.sort_unstable();
        labels
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_point_validation() {
        assert!(GpsPoint::new(41.3874, 2.1686).is_valid());
        assert!(!GpsPoint::new(91.0, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, 181.0).is_valid());
        assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, f64::INFINITY).is_valid());
        assert!(GpsPoint::new(-90.0, 180.0).is_valid());
    }

    #[test]
    fn test_empty_filter_allows_everything() {
        let filter = ActivityFilter::from_types(Vec::<String>::new());
        assert!(!filter.is_active());
        assert!(filter.allows("generic"));
        assert!(ActivityFilter::any().allows("anything"));
    }

    #[test]
    fn test_filter_restricts_labels() {
        let filter = ActivityFilter::from_types(["running", "generic"]);
        assert!(filter.is_active());
        assert!(filter.allows("running"));
        assert!(!filter.allows("cycling"));
        assert_eq!(filter.labels(), vec!["generic", "running"]);
    }
}
