//! H3 cell indexing.
//!
//! Cells are carried around as their canonical hex string (`8d39a339a4b13ff`)
//! so that they round-trip through CSV untouched. Conversion in either
//! direction is done with `h3o`; polygons come back as `geo` types.

use geo::{Coord, LineString, Polygon};
use h3o::{CellIndex, LatLng, Resolution};
use thiserror::Error;

use crate::{Diagnostic, Diagnostics, Error, GpsPoint, Result, Sample};

/// Failure to convert a single coordinate or cell. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("invalid cell index: {0}")]
    InvalidIndex(String),
}

/// A validated H3 resolution (0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellResolution(Resolution);

impl CellResolution {
    /// Resolution used when none is given (~44 m edge cells).
    pub const DEFAULT_LEVEL: u8 = 13;

    /// Validate a resolution level.
    pub fn new(level: u8) -> Result<Self> {
        Resolution::try_from(level)
            .map(Self)
            .map_err(|_| Error::InvalidResolution(level))
    }

    pub fn level(self) -> u8 {
        u8::from(self.0)
    }

    pub fn get(self) -> Resolution {
        self.0
    }
}

impl Default for CellResolution {
    fn default() -> Self {
        Self(Resolution::Thirteen)
    }
}

impl TryFrom<u8> for CellResolution {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

/// Map a coordinate to its H3 cell.
///
/// Positions outside ±90/±180 are rejected rather than wrapped.
pub fn cell_for(
    latitude: f64,
    longitude: f64,
    resolution: CellResolution,
) -> std::result::Result<CellIndex, CellError> {
    if !GpsPoint::new(latitude, longitude).is_valid() {
        return Err(CellError::InvalidCoordinate(format!(
            "({}, {}) is outside the valid range",
            latitude, longitude
        )));
    }
    let coord = LatLng::new(latitude, longitude)
        .map_err(|e| CellError::InvalidCoordinate(e.to_string()))?;
    Ok(coord.to_cell(resolution.get()))
}

/// Convert samples to (cell, activity label) pairs.
///
/// Samples that cannot be indexed are skipped and recorded in `diagnostics`.
pub fn index_samples(
    samples: &[Sample],
    resolution: CellResolution,
    diagnostics: &mut Diagnostics,
) -> Vec<(String, String)> {
    let mut cells = Vec::with_capacity(samples.len());
    for sample in samples {
        match cell_for(sample.point.latitude, sample.point.longitude, resolution) {
            Ok(cell) => cells.push((cell.to_string(), sample.activity_type.clone())),
            Err(e) => diagnostics.push(Diagnostic::InvalidCoordinate {
                latitude: sample.point.latitude,
                longitude: sample.point.longitude,
                resolution: resolution.level(),
                reason: e.to_string(),
            }),
        }
    }
    cells
}

/// Boundary polygon of a cell, x = longitude and y = latitude.
///
/// The exterior ring is closed (first vertex repeated last).
pub fn cell_polygon(cell: &str) -> std::result::Result<Polygon<f64>, CellError> {
    let index = cell
        .parse::<CellIndex>()
        .map_err(|e| CellError::InvalidIndex(e.to_string()))?;

    let ring: Vec<Coord> = index
        .boundary()
        .iter()
        .map(|vertex| Coord { x: vertex.lng(), y: vertex.lat() })
        .collect();

    // Polygon::new closes the ring
    Ok(Polygon::new(LineString::new(ring), vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Point};

    fn res(level: u8) -> CellResolution {
        CellResolution::new(level).unwrap()
    }

    #[test]
    fn test_resolution_range() {
        assert!(CellResolution::new(0).is_ok());
        assert!(CellResolution::new(15).is_ok());
        assert!(matches!(CellResolution::new(16), Err(Error::InvalidResolution(16))));
        assert_eq!(CellResolution::default().level(), CellResolution::DEFAULT_LEVEL);
    }

    #[test]
    fn test_indexing_is_deterministic() {
        let a = cell_for(41.3874, 2.1686, res(13)).unwrap();
        let b = cell_for(41.3874, 2.1686, res(13)).unwrap();
        assert_eq!(a, b);
        assert!(a.to_string().starts_with("8d"));
    }

    #[test]
    fn test_different_resolutions_give_different_cells() {
        let fine = cell_for(41.3874, 2.1686, res(13)).unwrap();
        let coarse = cell_for(41.3874, 2.1686, res(10)).unwrap();
        assert_ne!(fine, coarse);
    }

    #[test]
    fn test_invalid_coordinate_is_rejected() {
        assert!(matches!(
            cell_for(f64::NAN, 2.0, res(13)),
            Err(CellError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_out_of_range_coordinate_is_rejected() {
        assert!(matches!(
            cell_for(91.0, 2.0, res(13)),
            Err(CellError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            cell_for(41.0, -180.5, res(13)),
            Err(CellError::InvalidCoordinate(_))
        ));
        assert!(cell_for(90.0, 180.0, res(13)).is_ok());
    }

    #[test]
    fn test_index_samples_reports_out_of_range_sample() {
        let samples = vec![
            Sample::new(120.0, 2.1686, "generic"),
            Sample::new(41.3874, 2.1686, "generic"),
        ];
        let mut diagnostics = Diagnostics::new();
        let cells = index_samples(&samples, res(13), &mut diagnostics);

        assert_eq!(cells.len(), 1);
        assert!(matches!(
            diagnostics.iter().next(),
            Some(Diagnostic::InvalidCoordinate { latitude, .. }) if *latitude == 120.0
        ));
    }

    #[test]
    fn test_index_samples_skips_bad_samples() {
        let samples = vec![
            Sample::new(41.3874, 2.1686, "generic"),
            Sample::new(f64::INFINITY, 2.1686, "generic"),
            Sample::new(41.3875, 2.1687, "running"),
        ];
        let mut diagnostics = Diagnostics::new();
        let cells = index_samples(&samples, res(13), &mut diagnostics);

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].1, "generic");
        assert_eq!(cells[1].1, "running");
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics.iter().next(),
            Some(Diagnostic::InvalidCoordinate { resolution: 13, .. })
        ));
    }

    #[test]
    fn test_index_samples_empty_input() {
        let mut diagnostics = Diagnostics::new();
        assert!(index_samples(&[], res(13), &mut diagnostics).is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cell_polygon_is_closed_and_covers_center() {
        let cell = cell_for(41.3874, 2.1686, res(13)).unwrap();
        let polygon = cell_polygon(&cell.to_string()).unwrap();

        let ring = &polygon.exterior().0;
        assert!(ring.len() >= 7);
        assert_eq!(ring.first(), ring.last());

        let center = LatLng::from(cell);
        assert!(polygon.contains(&Point::new(center.lng(), center.lat())));
    }

    #[test]
    fn test_cell_polygon_rejects_garbage() {
        assert!(matches!(cell_polygon("not-a-cell"), Err(CellError::InvalidIndex(_))));
    }
}
