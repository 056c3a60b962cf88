//! Overpass API JSON model.
//!
//! Only the parts of an element that the tools read are modelled. Every
//! field is optional so that nodes, ways and relations all deserialize.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Response body of an `[out:json]` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
    #[serde(other)]
    Other,
}

/// A latitude/longitude pair as Overpass writes it (`{"lat": .., "lon": ..}`)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub id: i64,
    /// Node position
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Way/relation centroid (`out center`)
    pub center: Option<LatLon>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Way node positions (`out geom`); entries can be null
    #[serde(default)]
    pub geometry: Vec<Option<LatLon>>,
}

impl Element {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Node position, or the centroid for ways and relations.
    pub fn position(&self) -> Option<LatLon> {
        match self.kind {
            ElementKind::Way | ElementKind::Relation => self.center,
            _ => Some(LatLon {
                lat: self.lat?,
                lon: self.lon?,
            }),
        }
    }

    /// Way geometry with missing nodes dropped.
    pub fn coordinates(&self) -> impl Iterator<Item = LatLon> + '_ {
        self.geometry.iter().flatten().copied()
    }
}
