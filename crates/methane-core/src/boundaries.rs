//! Country boundary input: a GeoJSON FeatureCollection whose feature `id`
//! is the join key. Geometry is carried through without interpretation.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::BoundaryError;

pub const FEATURE_COLLECTION: &str = "FeatureCollection";
pub const FEATURE: &str = "Feature";

fn feature_type() -> String {
    FEATURE.to_string()
}

/// String ids are kept as is and numeric ids are stringified. Any other id
/// counts as missing.
fn join_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// `null` or a non-object `properties` reads as an empty map.
fn properties_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoundaryFeature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, deserialize_with = "join_key")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "properties_map")]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Value,
}

impl BoundaryFeature {
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoundaryCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<BoundaryFeature>,
}

impl BoundaryCollection {
    /// Parse and validate a boundary collection.
    ///
    /// Feature ids must be unique; features without an id are accepted here and
    /// left for the merge to drop.
    pub fn from_json_str(json: &str) -> Result<Self, BoundaryError> {
        let collection: BoundaryCollection = serde_json::from_str(json)?;
        if collection.kind != FEATURE_COLLECTION {
            return Err(BoundaryError::NotAFeatureCollection(collection.kind));
        }

        let mut seen = HashSet::new();
        for id in collection.features.iter().filter_map(|f| f.id.as_deref()) {
            if !seen.insert(id) {
                return Err(BoundaryError::DuplicateId(id.to_string()));
            }
        }
        Ok(collection)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.features.iter().any(|f| f.id.as_deref() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_COUNTRIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "AFG", "properties": {"name": "Afghanistan"},
             "geometry": {"type": "Polygon", "coordinates": [[[61.2, 35.6], [62.2, 35.2], [61.2, 35.6]]]}},
            {"type": "Feature", "id": "ALB", "properties": {"name": "Albania"},
             "geometry": {"type": "MultiPolygon", "coordinates": []}}
        ]
    }"#;

    #[test]
    fn parses_features_and_keeps_geometry() {
        let c = BoundaryCollection::from_json_str(TWO_COUNTRIES).unwrap();
        assert_eq!(c.features.len(), 2);
        assert_eq!(c.features[0].id.as_deref(), Some("AFG"));
        assert_eq!(c.features[0].name(), Some("Afghanistan"));
        assert_eq!(c.features[0].geometry["type"], "Polygon");
        assert!(c.contains_id("ALB"));
        assert!(!c.contains_id("XXX"));
    }

    #[test]
    fn rejects_other_geojson_types() {
        let err = BoundaryCollection::from_json_str(r#"{"type": "Feature", "features": []}"#).unwrap_err();
        assert!(matches!(err, BoundaryError::NotAFeatureCollection(t) if t == "Feature"));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = BoundaryCollection::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, BoundaryError::Json(_)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "AFG", "properties": {}, "geometry": null},
            {"type": "Feature", "id": "AFG", "properties": {}, "geometry": null}
        ]}"#;
        let err = BoundaryCollection::from_json_str(json).unwrap_err();
        assert!(matches!(err, BoundaryError::DuplicateId(id) if id == "AFG"));
    }

    #[test]
    fn feature_without_id_is_accepted() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "Somewhere"}, "geometry": null}
        ]}"#;
        let c = BoundaryCollection::from_json_str(json).unwrap();
        assert!(c.features[0].id.is_none());
    }

    #[test]
    fn numeric_ids_become_strings() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 42, "properties": {"name": "Answer"}, "geometry": null},
            {"type": "Feature", "id": 4.5, "properties": {}, "geometry": null},
            {"type": "Feature", "id": true, "properties": {}, "geometry": null}
        ]}"#;
        let c = BoundaryCollection::from_json_str(json).unwrap();
        assert_eq!(c.features[0].id.as_deref(), Some("42"));
        assert_eq!(c.features[1].id.as_deref(), Some("4.5"));
        assert_eq!(c.features[2].id, None);
        assert!(c.contains_id("42"));
    }

    #[test]
    fn null_properties_read_as_empty() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "AFG", "properties": null, "geometry": null},
            {"type": "Feature", "id": "ALB", "geometry": null}
        ]}"#;
        let c = BoundaryCollection::from_json_str(json).unwrap();
        assert!(c.features[0].properties.is_empty());
        assert!(c.features[1].properties.is_empty());
        assert_eq!(c.features[0].name(), None);
    }
}
