//! Join of country boundaries with the emissions table.

use std::collections::HashMap;

use crate::boundaries::{BoundaryCollection, BoundaryFeature};
use crate::dataset::{CountryFeature, CountryProperties, Dataset};
use crate::emissions::{self, EmissionsRecord};
use crate::error::MergeError;

/// Outcome of a merge. Unmatched entries on either side are diagnostics,
/// never failures.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    pub dataset: Dataset,
    /// Boundary features dropped for lack of emissions (by id, or name when
    /// the feature has no id), in boundary order.
    pub unmatched_features: Vec<String>,
    /// Emissions codes with no boundary feature, in table order.
    pub missing_countries: Vec<String>,
}

/// Attach each record's year series to the boundary feature with the same id.
///
/// Output order follows the boundary collection. Features without a matching
/// record are dropped; records without a matching feature are reported.
pub fn merge(boundaries: &BoundaryCollection, records: &[EmissionsRecord]) -> MergeReport {
    let by_code: HashMap<&str, &EmissionsRecord> =
        records.iter().map(|r| (r.code.as_str(), r)).collect();

    let missing_countries: Vec<String> = records
        .iter()
        .filter(|r| !boundaries.contains_id(&r.code))
        .map(|r| r.code.clone())
        .collect();
    if !missing_countries.is_empty() {
        tracing::warn!(
            count = missing_countries.len(),
            codes = ?missing_countries,
            "emissions rows missing from country boundaries"
        );
    }

    let mut features = Vec::with_capacity(boundaries.features.len());
    let mut unmatched_features = Vec::new();
    for feature in &boundaries.features {
        let record = feature.id.as_deref().and_then(|id| by_code.get(id));
        match (feature.id.as_deref(), record) {
            (Some(id), Some(record)) => features.push(attach(id, feature, record)),
            (id, _) => {
                let label = id
                    .or_else(|| feature.name())
                    .unwrap_or("<unnamed>")
                    .to_string();
                tracing::warn!(country = %label, "could not find emissions for country");
                unmatched_features.push(label);
            }
        }
    }

    MergeReport {
        dataset: Dataset::new(features),
        unmatched_features,
        missing_countries,
    }
}

fn attach(id: &str, feature: &BoundaryFeature, record: &EmissionsRecord) -> CountryFeature {
    let mut extra = feature.properties.clone();
    let name = match extra.remove("name") {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Null) => None,
        Some(other) => {
            tracing::warn!(country = %id, name = %other, "ignoring non-string country name");
            None
        }
        None => None,
    };
    // The attached series replaces any stale emissions property on the boundary.
    extra.remove(crate::config::EMISSIONS_PROPERTY);

    CountryFeature {
        kind: feature.kind.clone(),
        id: id.to_string(),
        properties: CountryProperties {
            name,
            extra,
            emissions: record.years.clone(),
        },
        geometry: feature.geometry.clone(),
    }
}

/// Parse both sources and render the merged collection as pretty JSON.
///
/// Nothing is written here; callers persist the returned text only on success.
pub fn merge_sources(
    boundaries_json: &str,
    emissions_csv: &str,
    base_year: i32,
) -> Result<(String, MergeReport), MergeError> {
    let boundaries = BoundaryCollection::from_json_str(boundaries_json)?;
    let records = emissions::parse_emissions_str(emissions_csv, base_year)?;
    let report = merge(&boundaries, &records);
    let text = report.dataset.to_json_pretty()?;
    Ok((text, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::YearValue;
    use crate::error::{BoundaryError, TabularError};
    use pretty_assertions::assert_eq;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "ABC", "properties": {"name": "Country A"},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}},
            {"type": "Feature", "id": "NOP", "properties": {"name": "No Data Land"},
             "geometry": {"type": "Polygon", "coordinates": []}},
            {"type": "Feature", "id": "XYZ", "properties": {"name": "Country X", "iso_n3": "999"},
             "geometry": {"type": "MultiPolygon", "coordinates": []}},
            {"type": "Feature", "properties": {"name": "Anonymous"}, "geometry": null}
        ]
    }"#;

    const EMISSIONS: &str = "\
Country Name,Country Code,Indicator Name,Indicator Code,1960,1961,1962,
Country A,ABC,Methane,EN.ATM.METH.KT.CE,10,,30,
Country X,XYZ,Methane,EN.ATM.METH.KT.CE,1.5,2.5,,
World,WLD,Methane,EN.ATM.METH.KT.CE,100,200,300,
";

    #[test]
    fn joins_by_code_and_reports_both_sides() {
        let (_, report) = merge_sources(BOUNDARIES, EMISSIONS, 1960).unwrap();
        let ids: Vec<&str> = report.dataset.features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["ABC", "XYZ"]);
        assert_eq!(report.unmatched_features, vec!["NOP".to_string(), "Anonymous".to_string()]);
        assert_eq!(report.missing_countries, vec!["WLD".to_string()]);

        let abc = report.dataset.find("ABC").unwrap();
        assert_eq!(abc.name(), "Country A");
        assert_eq!(abc.emissions(1960), YearValue::Present(10.0));
        assert_eq!(abc.emissions(1961), YearValue::NoData);
        assert_eq!(abc.emissions(1962), YearValue::Present(30.0));

        let xyz = report.dataset.find("XYZ").unwrap();
        assert_eq!(xyz.properties.extra.get("iso_n3"), Some(&serde_json::Value::from("999")));
    }

    #[test]
    fn every_output_id_exists_in_boundaries() {
        let boundaries = BoundaryCollection::from_json_str(BOUNDARIES).unwrap();
        let records = emissions::parse_emissions_str(EMISSIONS, 1960).unwrap();
        let report = merge(&boundaries, &records);
        for f in &report.dataset.features {
            assert!(boundaries.contains_id(&f.id), "{} not in boundaries", f.id);
        }
    }

    #[test]
    fn merge_is_byte_identical_across_runs() {
        let (first, _) = merge_sources(BOUNDARIES, EMISSIONS, 1960).unwrap();
        let (second, _) = merge_sources(BOUNDARIES, EMISSIONS, 1960).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn output_decodes_as_dataset() {
        let (text, report) = merge_sources(BOUNDARIES, EMISSIONS, 1960).unwrap();
        let decoded = Dataset::from_json_str(&text).unwrap();
        assert_eq!(decoded, report.dataset);
        assert!(text.contains("\"1961\": \"\""));
        assert!(text.starts_with("{\n  \"type\": \"FeatureCollection\""));
    }

    #[test]
    fn emissions_property_is_written_after_boundary_properties() {
        let (text, _) = merge_sources(BOUNDARIES, EMISSIONS, 1960).unwrap();
        let iso = text.find("\"iso_n3\"").unwrap();
        let emissions = text[iso..].find("\"emissions\"");
        assert!(emissions.is_some());
    }

    #[test]
    fn malformed_inputs_are_fatal() {
        let err = merge_sources("[]", EMISSIONS, 1960).unwrap_err();
        assert!(matches!(err, MergeError::Boundary(BoundaryError::Json(_))));

        let err = merge_sources(BOUNDARIES, "A,ABC,x,y,ten\n", 1960).unwrap_err();
        assert!(matches!(err, MergeError::Tabular(TabularError::InvalidValue { .. })));
    }

    #[test]
    fn non_string_names_are_dropped_so_output_still_decodes() {
        let boundaries = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "ABC", "properties": {"name": 7}, "geometry": null},
            {"type": "Feature", "id": "XYZ", "properties": {"name": null, "iso_n3": "999"}, "geometry": null}
        ]}"#;
        let (text, report) = merge_sources(boundaries, EMISSIONS, 1960).unwrap();
        let decoded = Dataset::from_json_str(&text).unwrap();
        assert_eq!(decoded, report.dataset);
        let abc = decoded.find("ABC").unwrap();
        assert_eq!(abc.properties.name, None);
        assert!(abc.properties.extra.get("name").is_none());
        assert_eq!(abc.name(), "ABC");
    }

    #[test]
    fn numeric_boundary_ids_join_against_codes() {
        let boundaries = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 42, "properties": null, "geometry": null}
        ]}"#;
        let (text, report) = merge_sources(boundaries, "Answer,42,x,y,1\n", 1960).unwrap();
        assert_eq!(report.dataset.features[0].id, "42");
        assert!(report.missing_countries.is_empty());
        assert_eq!(Dataset::from_json_str(&text).unwrap(), report.dataset);
    }

    #[test]
    fn no_matches_yields_empty_collection() {
        let (text, report) = merge_sources(BOUNDARIES, "Q,QQQ,x,y,1\n", 1960).unwrap();
        assert!(report.dataset.is_empty());
        assert_eq!(report.unmatched_features.len(), 4);
        assert_eq!(report.missing_countries, vec!["QQQ".to_string()]);
        assert!(Dataset::from_json_str(&text).unwrap().is_empty());
    }
}
