// src/map/source.rs
//! Vector source built from local GeoJSON feature collections

use super::engine::{FeatureId, Geometry, Properties};
use crate::error::{MapError, Result};
use crate::geo::LngLat;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    pub id: Option<FeatureId>,
    pub geometry: Geometry,
    pub properties: Properties,
}

impl SourceFeature {
    /// Numeric property, accepting numbers and numeric strings
    pub fn number(&self, property: &str) -> Option<f64> {
        match self.properties.get(property)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Property rendered as label text
    pub fn text(&self, property: &str) -> Option<String> {
        match self.properties.get(property)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A vector source: named source layers, each a list of features
#[derive(Debug, Clone, Default)]
pub struct VectorSource {
    layers: HashMap<String, Vec<SourceFeature>>,
}

impl VectorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append features to a source layer
    pub fn insert_features(&mut self, source_layer: &str, features: Vec<SourceFeature>) {
        self.layers.entry(source_layer.to_string()).or_default().extend(features);
    }

    pub fn features(&self, source_layer: &str) -> &[SourceFeature] {
        self.layers.get(source_layer).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn feature_count(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    /// Load a GeoJSON file into a source layer, returning how many features were kept
    pub fn load_geojson_file(&mut self, source_layer: &str, path: &Path) -> Result<usize> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;
        let features = parse_feature_collection(&contents)?;
        let count = features.len();
        tracing::info!(path = %path.display(), source_layer, count, "loaded source features");
        self.insert_features(source_layer, features);
        Ok(count)
    }
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<serde_json::Value>,
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point { coordinates: Vec<f64> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

/// Numeric feature id; numeric strings are accepted, anything else is unusable
fn feature_id(value: &serde_json::Value) -> Option<FeatureId> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn ring(positions: &[Vec<f64>]) -> Option<Vec<LngLat>> {
    positions.iter().map(|p| LngLat::from_position(p)).collect()
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Option<Vec<Vec<LngLat>>> {
    rings.iter().map(|r| ring(r)).collect()
}

fn geometry(raw: &RawGeometry) -> Option<Geometry> {
    match raw {
        RawGeometry::Point { coordinates } => LngLat::from_position(coordinates).map(Geometry::Point),
        RawGeometry::Polygon { coordinates } => polygon(coordinates).map(Geometry::Polygon),
        RawGeometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .map(|p| polygon(p))
            .collect::<Option<Vec<_>>>()
            .map(Geometry::MultiPolygon),
        RawGeometry::Unsupported => None,
    }
}

/// Parse a GeoJSON FeatureCollection, skipping features with unsupported geometry
pub fn parse_feature_collection(body: &str) -> Result<Vec<SourceFeature>> {
    let raw: RawCollection = serde_json::from_str(body)?;

    let mut features = Vec::with_capacity(raw.features.len());
    for (index, feature) in raw.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry.as_ref().and_then(geometry) else {
            tracing::debug!(index, "skipping feature with unsupported geometry");
            continue;
        };

        features.push(SourceFeature {
            id: feature.id.as_ref().and_then(feature_id),
            geometry,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILDINGS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":101,"properties":{"height":12.5},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
        {"type":"Feature","id":"202","properties":{"height":"30"},
         "geometry":{"type":"MultiPolygon","coordinates":[[[[2,2],[3,2],[3,3],[2,2]]]]}},
        {"type":"Feature","id":"tower","properties":{},
         "geometry":{"type":"Polygon","coordinates":[[[4,4],[5,4],[5,5],[4,4]]]}},
        {"type":"Feature","id":303,"properties":{},
         "geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}},
        {"type":"Feature","id":404,"geometry":null}
    ]}"#;

    #[test]
    fn test_parse_buildings() {
        let features = parse_feature_collection(BUILDINGS).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].id, Some(101));
        assert_eq!(features[0].number("height"), Some(12.5));
        assert_eq!(features[1].id, Some(202));
        assert_eq!(features[1].number("height"), Some(30.0));
        assert!(matches!(features[1].geometry, Geometry::MultiPolygon(_)));
        assert_eq!(features[2].id, None);
    }

    #[test]
    fn test_text_property() {
        let body = r#"{"features":[{"properties":{"house_num":1600},"geometry":{"type":"Point","coordinates":[-77.0365,38.8977]}}]}"#;
        let features = parse_feature_collection(body).unwrap();
        assert_eq!(features[0].text("house_num").as_deref(), Some("1600"));
        assert_eq!(features[0].text("missing"), None);
    }

    #[test]
    fn test_bad_coordinates_are_skipped() {
        let body = r#"{"features":[{"id":1,"geometry":{"type":"Point","coordinates":[1]}}]}"#;
        assert!(parse_feature_collection(body).unwrap().is_empty());
    }

    #[test]
    fn test_load_geojson_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.geojson");
        std::fs::write(&path, BUILDINGS).unwrap();

        let mut source = VectorSource::new();
        assert_eq!(source.load_geojson_file("building", &path).unwrap(), 3);
        assert_eq!(source.features("building").len(), 3);
        assert!(source.features("housenum_label").is_empty());
        assert_eq!(source.feature_count(), 3);

        assert!(source.load_geojson_file("building", &dir.path().join("nope.geojson")).is_err());
    }
}
