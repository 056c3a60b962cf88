//! SQLite store for OpenStreetMap ways.
//!
//! Ways are keyed by OSM id and labelled with a free-form `way_type`
//! ("smooth_asphalt", "bike_lanes", ...). Storing a way that already exists
//! replaces it. Geometry is kept as GeoJSON text so export is a straight
//! read.

use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry};
use log::{debug, info};
use rusqlite::{Connection, params};
use serde_json::{Map, Value as JsonValue};

use crate::osm::{Element, ElementKind};
use crate::Result;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ways (
        osm_id INTEGER PRIMARY KEY,
        way_type TEXT NOT NULL,
        name TEXT,
        geojson TEXT NOT NULL,
        tags TEXT
    )
";

/// LineString of the way's node positions as [lon, lat].
pub fn way_to_linestring(element: &Element) -> Geometry {
    let coordinates = element.coordinates().map(|c| vec![c.lon, c.lat]).collect();
    Geometry::new(geojson::Value::LineString(coordinates))
}

pub struct WayStore {
    conn: Connection,
}

impl WayStore {
    /// Open (or create) a database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Upsert every `way` element under `way_type`; other elements are
    /// ignored. Returns the number of ways written.
    pub fn store_ways(&mut self, elements: &[Element], way_type: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO ways (osm_id, way_type, name, geojson, tags)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for element in elements.iter().filter(|e| e.kind == ElementKind::Way) {
                let geojson = serde_json::to_string(&way_to_linestring(element))?;
                let tags = serde_json::to_string(&element.tags)?;
                stmt.execute(params![element.id, way_type, element.tag("name"), geojson, tags])?;
                count += 1;
            }
        }
        tx.commit()?;

        info!("Stored {} ways with type '{}'", count, way_type);
        Ok(count)
    }

    /// Distinct way types, sorted.
    pub fn list_types(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT way_type FROM ways ORDER BY way_type")?;
        let types = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(types)
    }

    /// All ways, or only those of `way_type`, as LineString features.
    pub fn export(&self, way_type: Option<&str>) -> Result<FeatureCollection> {
        let mut stmt = self.conn.prepare(
            "SELECT osm_id, way_type, name, geojson, tags FROM ways
             WHERE ?1 IS NULL OR way_type = ?1",
        )?;

        let rows = stmt
            .query_map(params![way_type], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut features = Vec::with_capacity(rows.len());
        for (osm_id, way_type, name, geojson, tags) in rows {
            let geometry: Geometry = serde_json::from_str(&geojson)?;
            let tags: JsonValue = match tags.as_deref() {
                Some(text) if !text.is_empty() => serde_json::from_str(text)?,
                _ => JsonValue::Object(Map::new()),
            };

            let mut properties = Map::new();
            properties.insert("osm_id".to_string(), JsonValue::from(osm_id));
            properties.insert("way_type".to_string(), JsonValue::from(way_type));
            properties.insert("name".to_string(), name.map_or(JsonValue::Null, JsonValue::from));
            properties.insert("tags".to_string(), tags);

            features.push(Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
        debug!("Exported {} ways", features.len());

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}
