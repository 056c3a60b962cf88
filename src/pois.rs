//! Points of interest for the skating map: skate parks, pump tracks and
//! drinking water.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::{Map, Value as JsonValue};

use crate::osm::{Element, LatLon};

/// Which POI layer to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiKind {
    /// Skate parks, roller skating spots and pump tracks
    SkateParks,
    DrinkingWater,
}

impl PoiKind {
    /// Overpass query for this layer within `bbox` (`south,west,north,east`).
    pub fn query(self, bbox: &str) -> String {
        match self {
            PoiKind::SkateParks => format!(
                r#"[out:json][timeout:120][bbox:{bbox}];
(
  node["sport"~"skateboard|roller_skating"];
  way["sport"~"skateboard|roller_skating"];
  node["cycling"="pump_track"];
  way["cycling"="pump_track"];
);
out center;"#
            ),
            PoiKind::DrinkingWater => {
                format!("[out:json][timeout:120][bbox:{bbox}];node[amenity=drinking_water];out;")
            }
        }
    }

    /// Convert fetched elements into this layer's features.
    pub fn to_geojson(self, elements: &[Element]) -> FeatureCollection {
        match self {
            PoiKind::SkateParks => skate_pois_to_geojson(elements),
            PoiKind::DrinkingWater => drinking_water_to_geojson(elements),
        }
    }

    pub fn default_output(self) -> &'static str {
        match self {
            PoiKind::SkateParks => "data/skate_pois.geojson",
            PoiKind::DrinkingWater => "data/drinking_water.geojson",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PoiKind::SkateParks => "skate parks and pump tracks",
            PoiKind::DrinkingWater => "drinking water locations",
        }
    }
}

/// `pump_track` for `cycling=pump_track`, `skate_park` for everything else.
pub fn poi_type(tags: &BTreeMap<String, String>) -> &'static str {
    if tags.get("cycling").map(String::as_str) == Some("pump_track") {
        "pump_track"
    } else {
        "skate_park"
    }
}

/// Thumbnail URL from `wikimedia_commons` or `image`, or an empty string.
pub fn image_url(tags: &BTreeMap<String, String>) -> String {
    if let Some(commons) = tags.get("wikimedia_commons") {
        let filename = commons.replace("File:", "").replace(' ', "_");
        return format!(
            "https://commons.wikimedia.org/wiki/Special:FilePath/{}?width=300",
            filename
        );
    }
    tags.get("image").cloned().unwrap_or_default()
}

fn point_feature(position: LatLon, properties: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![position.lon, position.lat]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Skate POIs as points; ways use their centroid. Elements without a
/// position are skipped.
pub fn skate_pois_to_geojson(elements: &[Element]) -> FeatureCollection {
    let features = elements
        .iter()
        .filter_map(|element| {
            let position = element.position()?;
            let tag = |key: &str| JsonValue::from(element.tag(key).unwrap_or_default());

            let mut properties = Map::new();
            properties.insert("name".to_string(), tag("name"));
            properties.insert("poi_type".to_string(), JsonValue::from(poi_type(&element.tags)));
            properties.insert("sport".to_string(), tag("sport"));
            properties.insert("surface".to_string(), tag("surface"));
            properties.insert("image".to_string(), JsonValue::from(image_url(&element.tags)));

            Some(point_feature(position, properties))
        })
        .collect();
    collection(features)
}

/// Drinking water nodes as points, with their raw tags as properties.
pub fn drinking_water_to_geojson(elements: &[Element]) -> FeatureCollection {
    let features = elements
        .iter()
        .filter_map(|element| {
            let position = element.position()?;
            let properties = element
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::from(v.as_str())))
                .collect();
            Some(point_feature(position, properties))
        })
        .collect();
    collection(features)
}
