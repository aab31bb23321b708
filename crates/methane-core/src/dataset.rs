//! The combined country + emissions collection written by the merger and
//! decoded once by the presentation layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::boundaries::{FEATURE, FEATURE_COLLECTION};
use crate::emissions::{YearSeries, YearValue};
use crate::error::DatasetError;

fn feature_type() -> String {
    FEATURE.to_string()
}

fn collection_type() -> String {
    FEATURE_COLLECTION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Boundary properties other than the name, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub emissions: YearSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryFeature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    pub id: String,
    pub properties: CountryProperties,
    #[serde(default)]
    pub geometry: Value,
}

impl CountryFeature {
    pub fn name(&self) -> &str {
        self.properties.name.as_deref().unwrap_or(&self.id)
    }

    pub fn emissions(&self, year: i32) -> YearValue {
        self.properties.emissions.get(year)
    }
}

/// Typed form of the combined feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    pub features: Vec<CountryFeature>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Dataset {
    pub fn new(features: Vec<CountryFeature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }

    /// Decode a combined collection. Emission values are typed here so nothing
    /// downstream has to re-parse property text.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let dataset: Dataset = serde_json::from_str(json)?;
        if dataset.kind != FEATURE_COLLECTION {
            return Err(DatasetError::NotAFeatureCollection(dataset.kind));
        }
        Ok(dataset)
    }

    /// Pretty JSON with two-space indentation. Key order is stable, so equal
    /// datasets always serialise to equal bytes.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&CountryFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.features.iter().position(|f| f.id == id)
    }

    /// Earliest and latest year present in any series.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let first = self
            .features
            .iter()
            .filter_map(|f| f.properties.emissions.first_year())
            .min()?;
        let last = self
            .features
            .iter()
            .filter_map(|f| f.properties.emissions.last_year())
            .max()?;
        Some((first, last))
    }
}

#[cfg(test)]
pub(crate) fn test_feature(id: &str, name: &str, values: &[(i32, YearValue)]) -> CountryFeature {
    CountryFeature {
        kind: feature_type(),
        id: id.to_string(),
        properties: CountryProperties {
            name: Some(name.to_string()),
            extra: Map::new(),
            emissions: values.iter().copied().collect(),
        },
        geometry: Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMBINED: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "id": "AFG",
          "properties": {
            "name": "Afghanistan",
            "continent": "Asia",
            "emissions": { "1970": "10450.2", "1971": "", "1972": 11000 }
          },
          "geometry": { "type": "Polygon", "coordinates": [] }
        }
      ]
    }"#;

    #[test]
    fn decodes_typed_emissions_and_keeps_extra_properties() {
        let ds = Dataset::from_json_str(COMBINED).unwrap();
        let afg = ds.find("AFG").unwrap();
        assert_eq!(afg.name(), "Afghanistan");
        assert_eq!(afg.emissions(1970), YearValue::Present(10450.2));
        assert_eq!(afg.emissions(1971), YearValue::NoData);
        assert_eq!(afg.emissions(1972), YearValue::Present(11000.0));
        assert_eq!(afg.properties.extra.get("continent"), Some(&Value::from("Asia")));
        assert!(!afg.properties.extra.contains_key("emissions"));
        assert_eq!(ds.year_span(), Some((1970, 1972)));
    }

    #[test]
    fn malformed_emissions_surface_as_parse_error() {
        let bad = COMBINED.replace("\"10450.2\"", "\"lots\"");
        assert!(matches!(Dataset::from_json_str(&bad), Err(DatasetError::Json(_))));
    }

    #[test]
    fn rejects_non_collection() {
        let err = Dataset::from_json_str(r#"{"type": "Topology", "features": []}"#).unwrap_err();
        assert!(matches!(err, DatasetError::NotAFeatureCollection(_)));
    }

    #[test]
    fn reserialised_dataset_decodes_to_itself() {
        let ds = Dataset::from_json_str(COMBINED).unwrap();
        let again = Dataset::from_json_str(&ds.to_json_pretty().unwrap()).unwrap();
        assert_eq!(ds, again);
    }

    #[test]
    fn name_falls_back_to_id() {
        let mut ds = Dataset::from_json_str(COMBINED).unwrap();
        ds.features[0].properties.name = None;
        assert_eq!(ds.features[0].name(), "AFG");
    }

    #[test]
    fn empty_dataset_has_no_span() {
        assert_eq!(Dataset::new(Vec::new()).year_span(), None);
    }
}
