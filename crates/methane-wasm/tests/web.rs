#![cfg(target_arch = "wasm32")]

use methane_wasm::MapController;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const DATASET: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "id": "AAA", "properties": {"name": "Alpha", "emissions": {"1990": 5}}, "geometry": null},
    {"type": "Feature", "id": "BBB", "properties": {"name": "Bravo", "emissions": {"1990": ""}}, "geometry": null}
  ]
}"#;

#[wasm_bindgen_test]
fn features_are_plain_geojson_objects() {
    let mut c = MapController::new(None, "/year/1990").unwrap();
    c.load_dataset(DATASET, 0.0).unwrap();
    let features = c.features().unwrap();
    let json = to_json_string(&features);
    assert!(json.contains("\"emissionPercentile\":19"));
    assert!(json.contains("\"emissionPercentile\":-1"));
}

#[wasm_bindgen_test]
fn tooltip_is_null_without_hover() {
    let c = MapController::new(None, "/").unwrap();
    assert!(c.tooltip().unwrap().is_null());
}

#[wasm_bindgen_test]
fn invalid_config_is_rejected() {
    assert!(MapController::new(Some("{ nope".into()), "/").is_err());
}

fn to_json_string(value: &JsValue) -> String {
    serde_wasm_bindgen::from_value::<serde_json::Value>(value.clone())
        .map(|v| v.to_string())
        .unwrap_or_default()
}
