use gloo_net::http::Request;
use methane_core::{Action, Controller, Effect, MapConfig, ViewState};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    // Plain objects rather than JS Maps, so the map library can read them as GeoJSON.
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn url_of(effects: Vec<Effect>) -> Option<String> {
    effects.into_iter().last().map(|Effect::ReplaceUrl(url)| url)
}

fn millis(now_ms: f64) -> u64 {
    if now_ms.is_finite() && now_ms > 0.0 {
        now_ms as u64
    } else {
        0
    }
}

/// Path of the combined dataset for the current environment.
#[wasm_bindgen(js_name = dataUrl)]
pub fn data_url(prod: bool) -> String {
    Controller::data_url(prod).to_string()
}

/// Fetch the combined dataset as text. Hand the result to `MapController.loadDataset`.
#[wasm_bindgen(js_name = fetchDataset)]
pub async fn fetch_dataset(prod: bool) -> Result<String, JsValue> {
    let resp = Request::get(Controller::data_url(prod))
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!(
            "dataset fetch failed: HTTP {}",
            resp.status()
        )));
    }
    resp.text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[derive(Serialize)]
struct TooltipView {
    title: String,
    emissions: String,
    percentile: String,
    rank: String,
    x: f64,
    y: f64,
}

/// Browser-side owner of the map state. Methods that may change the URL return
/// the path to pass to `history.replaceState`, or `undefined`.
#[wasm_bindgen]
pub struct MapController {
    inner: Controller,
}

#[wasm_bindgen]
impl MapController {
    /// `config_json` may be omitted or partial; `location` is the current
    /// path and query string.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, location: &str) -> Result<MapController, JsValue> {
        let config = match config_json {
            Some(json) => MapConfig::from_json_str(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?,
            None => MapConfig::default(),
        };
        Ok(Self {
            inner: Controller::from_location(config, location),
        })
    }

    #[wasm_bindgen(js_name = loadDataset)]
    pub fn load_dataset(&mut self, json: &str, now_ms: f64) -> Result<Option<String>, JsValue> {
        self.inner
            .load_dataset_json(json, millis(now_ms))
            .map(url_of)
            .map_err(|e| JsValue::from_str(&format!("Invalid dataset: {e}")))
    }

    #[wasm_bindgen(getter)]
    pub fn year(&self) -> i32 {
        self.inner.state().year
    }

    #[wasm_bindgen(js_name = setYear)]
    pub fn set_year(&mut self, year: i32, now_ms: f64) -> Option<String> {
        url_of(self.inner.dispatch(Action::YearSelected(year), millis(now_ms)))
    }

    #[wasm_bindgen(js_name = setView)]
    pub fn set_view(&mut self, latitude: f64, longitude: f64, zoom: f64, bearing: f64, pitch: f64, now_ms: f64) {
        let view = ViewState {
            latitude,
            longitude,
            zoom,
            bearing,
            pitch,
        };
        // View URLs are debounced and come back through `poll`.
        self.inner.dispatch(Action::ViewChanged(view), millis(now_ms));
    }

    /// Current camera as `{ latitude, longitude, zoom, bearing, pitch }`.
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.state().view)
    }

    /// Pending URL update whose debounce window has elapsed.
    pub fn poll(&mut self, now_ms: f64) -> Option<String> {
        self.inner
            .poll(millis(now_ms))
            .map(|Effect::ReplaceUrl(url)| url)
    }

    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.inner.next_deadline_ms().map(|ms| ms as f64)
    }

    pub fn hover(&mut self, feature_id: Option<String>, x: f64, y: f64) {
        self.inner.dispatch(Action::Hovered { feature_id, x, y }, 0);
    }

    #[wasm_bindgen(js_name = clearHover)]
    pub fn clear_hover(&mut self) {
        self.inner.dispatch(Action::HoverCleared, 0);
    }

    #[wasm_bindgen(js_name = currentUrl)]
    pub fn current_url(&self) -> String {
        self.inner.current_url()
    }

    /// Feature collection with `emissionPercentile` and `rank` for the active year.
    pub fn features(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.layer())
    }

    /// Fill layer definition (id, type, paint) matching `features`.
    #[wasm_bindgen(js_name = fillLayer)]
    pub fn fill_layer(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.fill_layer())
    }

    /// Tooltip lines for the hovered country, or `null`.
    pub fn tooltip(&self) -> Result<JsValue, JsValue> {
        match self.inner.tooltip() {
            Some(tip) => to_js(&TooltipView {
                title: tip.title(),
                emissions: tip.emissions_label(),
                percentile: tip.percentile_label(),
                rank: tip.rank_label(),
                x: tip.x,
                y: tip.y,
            }),
            None => Ok(JsValue::NULL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_of_takes_last_replace() {
        let effects = vec![
            Effect::ReplaceUrl("/year/1990".into()),
            Effect::ReplaceUrl("/year/1991".into()),
        ];
        assert_eq!(url_of(effects), Some("/year/1991".to_string()));
        assert_eq!(url_of(Vec::new()), None);
    }

    #[test]
    fn millis_clamps_bad_clock_values() {
        assert_eq!(millis(f64::NAN), 0);
        assert_eq!(millis(-5.0), 0);
        assert_eq!(millis(1234.9), 1234);
    }

    #[test]
    fn controller_tracks_year_without_js() {
        let mut c = MapController::new(None, "/year/1980").map_err(|_| "ctor").unwrap();
        assert_eq!(c.year(), 1980);
        assert_eq!(
            c.set_year(1981, 0.0),
            Some("/year/1981?lat=30&lng=-10&zoom=1.4".to_string())
        );
        c.set_view(1.0, 2.0, 3.0, 0.0, 0.0, 10.0);
        assert_eq!(c.poll(20.0), None);
        assert_eq!(c.poll(60.0), Some("/year/1981?lat=1&lng=2&zoom=3".to_string()));
    }
}
