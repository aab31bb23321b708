use serde::{Deserialize, Serialize};

// ── Dataset constants ─────────────────────────────────────────────────────────

/// First year column of the World Bank indicator export.
pub const DEFAULT_BASE_YEAR: i32 = 1960;

/// Slider range. Earlier years are almost entirely empty in the source data.
pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 2012;

/// Property name under which the merger attaches the year series.
pub const EMISSIONS_PROPERTY: &str = "emissions";

pub const PROD_DATA_PATH: &str = "/a/methane-emissions/data/country-emissions.geo.json";
pub const DEV_DATA_PATH: &str = "/data/country-emissions.geo.json";
pub const PROD_BASE_PATH: &str = "/a/methane-emissions";

/// Fill used for features without a value in the active year.
pub const NO_DATA_COLOR: &str = "black";

/// Light-to-dark blue ramp, one entry per quantile bucket.
pub const DEFAULT_PALETTE: [&str; 20] = [
    "#D9E6FF", "#CDDAF6", "#C2CEED", "#B6C2E4", "#ABB7DB", "#9FABD2", "#949FC9", "#8993C1",
    "#7D88B8", "#727CAF", "#6670A6", "#5B649D", "#4F5994", "#444D8C", "#394183", "#2D357A",
    "#222A71", "#161E68", "#0B125F", "#000757",
];

// ── View ──────────────────────────────────────────────────────────────────────

/// Camera state of the map. Coordinates are degrees, zoom is a web-mercator level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub bearing: f64,
    #[serde(default)]
    pub pitch: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            latitude: 30.0,
            longitude: -10.0,
            zoom: 1.4,
            bearing: 0.0,
            pitch: 0.0,
        }
    }
}

// ── Map configuration ─────────────────────────────────────────────────────────

/// Presentation settings. Every field has a default so a partial JSON
/// document (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// One color per quantile bucket; its length is the bucket count.
    pub palette: Vec<String>,
    pub no_data_color: String,
    pub min_year: i32,
    pub max_year: i32,
    /// Year shown before the URL or the user picks one.
    pub initial_year: i32,
    pub initial_view: ViewState,
    /// Coalescing window for view-driven URL updates, in milliseconds.
    pub debounce_ms: u64,
    /// Path prefix the app is mounted under, e.g. "/a/methane-emissions".
    pub base_path: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            no_data_color: NO_DATA_COLOR.to_string(),
            min_year: MIN_YEAR,
            max_year: MAX_YEAR,
            initial_year: MIN_YEAR,
            initial_view: ViewState::default(),
            debounce_ms: 50,
            base_path: String::new(),
        }
    }
}

impl MapConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Number of quantile buckets. Never zero.
    pub fn color_stops(&self) -> usize {
        self.palette.len().max(1)
    }

    pub fn clamp_year(&self, year: i32) -> i32 {
        year.clamp(self.min_year, self.max_year.max(self.min_year))
    }

    /// Color for a bucket index; `None` is the no-data fill.
    pub fn color_for(&self, bucket: Option<usize>) -> &str {
        match bucket.and_then(|b| self.palette.get(b)) {
            Some(color) => color,
            None => &self.no_data_color,
        }
    }

    pub fn data_url(prod: bool) -> &'static str {
        if prod {
            PROD_DATA_PATH
        } else {
            DEV_DATA_PATH
        }
    }
}
