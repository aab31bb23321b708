//! Projection of application state into what the map renderer draws: a
//! feature collection with per-year styling properties, and the fill layer
//! that colors it.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::classify::Classification;
use crate::config::{MapConfig, EMISSIONS_PROPERTY};
use crate::dataset::CountryFeature;
use crate::state::AppState;

pub const LAYER_ID: &str = "data";
pub const PERCENTILE_PROPERTY: &str = "emissionPercentile";
pub const RANK_PROPERTY: &str = "rank";
pub const FILL_OPACITY: f32 = 0.8;

/// Sentinel bucket used by the renderer for features without data.
pub const NO_DATA_BUCKET: i64 = -1;

/// Fill layer description in the shape map styles expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillLayer {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub paint: FillPaint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillPaint {
    #[serde(rename = "fill-color")]
    pub fill_color: ColorStops,
    #[serde(rename = "fill-opacity")]
    pub fill_opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorStops {
    pub property: &'static str,
    pub stops: Vec<(i64, String)>,
}

impl FillLayer {
    pub fn from_config(config: &MapConfig) -> Self {
        let mut stops = Vec::with_capacity(config.palette.len() + 1);
        stops.push((NO_DATA_BUCKET, config.no_data_color.clone()));
        stops.extend(
            config
                .palette
                .iter()
                .enumerate()
                .map(|(i, color)| (i as i64, color.clone())),
        );
        Self {
            id: LAYER_ID,
            kind: "fill",
            paint: FillPaint {
                fill_color: ColorStops {
                    property: PERCENTILE_PROPERTY,
                    stops,
                },
                fill_opacity: FILL_OPACITY,
            },
        }
    }
}

/// The dataset as a GeoJSON collection whose properties carry the active
/// year's bucket (`-1` for no data) and rank (`null` for no data).
pub fn layer_collection(state: &AppState) -> Value {
    let features: Vec<Value> = state
        .dataset
        .features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let class = state.classification.get(i).copied().unwrap_or_default();
            styled_feature(feature, class)
        })
        .collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn styled_feature(feature: &CountryFeature, class: Classification) -> Value {
    let mut properties = Map::new();
    if let Some(name) = &feature.properties.name {
        properties.insert("name".to_string(), Value::from(name.as_str()));
    }
    for (k, v) in &feature.properties.extra {
        properties.insert(k.clone(), v.clone());
    }
    properties.insert(
        EMISSIONS_PROPERTY.to_string(),
        Value::from(&feature.properties.emissions),
    );
    properties.insert(
        PERCENTILE_PROPERTY.to_string(),
        Value::from(class.bucket_or_sentinel()),
    );
    properties.insert(
        RANK_PROPERTY.to_string(),
        class.rank.map_or(Value::Null, |r| Value::from(r as u64)),
    );

    json!({
        "type": feature.kind,
        "id": feature.id,
        "properties": properties,
        "geometry": feature.geometry,
    })
}
