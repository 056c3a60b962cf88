//! GeoJSON heatmap export.
//!
//! Counts from the visit table are re-aggregated per cell (summing over
//! activities), thresholded, and every surviving cell becomes a Polygon
//! feature with its hexagon boundary.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::{Map, Value as JsonValue};

use crate::cells::cell_polygon;
use crate::table::LoadedTable;
use crate::{ActivityFilter, Diagnostic, Diagnostics, Result};

/// Configuration for polygon export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Cells with fewer total visits are dropped (default: 5)
    pub min_count: u32,
    /// Activity labels to keep; ignored if the table has no activity column
    pub activity_filter: ActivityFilter,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            min_count: 5,
            activity_filter: ActivityFilter::any(),
        }
    }
}

/// Total visits per cell in first-seen order.
pub fn cell_totals(table: &LoadedTable, filter: &ActivityFilter) -> Vec<(String, u64)> {
    let filtering = table.has_activity_type && filter.is_active();

    let mut order: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in &table.rows {
        if filtering {
            if !filter.allows(&row.activity_type) {
                continue;
            }
        }

        match index.get(&row.h3_cell) {
            Some(&i) => order[i].1 += u64::from(row.count),
            None => {
                index.insert(row.h3_cell.clone(), order.len());
                order.push((row.h3_cell.clone(), u64::from(row.count)));
            }
        }
    }

    order
}

/// Build the heatmap FeatureCollection.
///
/// Cells that cannot be converted are skipped and recorded in `diagnostics`.
pub fn export_polygons(
    table: &LoadedTable,
    config: &ExportConfig,
    diagnostics: &mut Diagnostics,
) -> FeatureCollection {
    let features = cell_totals(table, &config.activity_filter)
        .into_iter()
        .filter(|(_, count)| *count >= u64::from(config.min_count))
        .filter_map(|(cell, count)| match cell_polygon(&cell) {
            Ok(polygon) => {
                let mut properties = Map::new();
                properties.insert("h3_cell".to_string(), JsonValue::from(cell));
                properties.insert("count".to_string(), JsonValue::from(count));

                Some(Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::from(&polygon))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                })
            }
            Err(e) => {
                diagnostics.push(Diagnostic::InvalidCell {
                    cell,
                    reason: e.to_string(),
                });
                None
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Write a FeatureCollection as compact JSON.
pub fn write_geojson<W: Write>(writer: W, collection: &FeatureCollection) -> Result<()> {
    serde_json::to_writer(writer, collection)?;
    Ok(())
}

/// Write a FeatureCollection as indented JSON.
pub fn write_geojson_pretty<W: Write>(writer: W, collection: &FeatureCollection) -> Result<()> {
    serde_json::to_writer_pretty(writer, collection)?;
    Ok(())
}

/// Write a FeatureCollection to a file, creating parent directories.
pub fn write_geojson_file(path: &Path, collection: &FeatureCollection, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = io::BufWriter::new(File::create(path)?);
    if pretty {
        write_geojson_pretty(&mut writer, collection)?;
    } else {
        write_geojson(&mut writer, collection)?;
    }
    writer.flush()?;
    Ok(())
}
