//! Application state and its pure transitions.
//!
//! `reduce` never mutates its input: every action yields a fresh `AppState`.
//! The dataset and classification sit behind `Arc`, so a new state shares them
//! with the old one unless the action actually changes them.

use std::fmt;
use std::sync::Arc;

use crate::classify::{classify_year, ordinal, Classification};
use crate::config::{MapConfig, ViewState};
use crate::dataset::Dataset;
use crate::emissions::YearValue;

#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub feature_id: String,
    /// Pointer position relative to the map container, in CSS pixels.
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DatasetLoaded(Arc<Dataset>),
    YearSelected(i32),
    ViewChanged(ViewState),
    /// Pointer moved over the map; `feature_id` is `None` off any country.
    Hovered {
        feature_id: Option<String>,
        x: f64,
        y: f64,
    },
    HoverCleared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub year: i32,
    pub view: ViewState,
    pub dataset: Arc<Dataset>,
    /// One entry per dataset feature, in feature order, for `year`.
    pub classification: Arc<[Classification]>,
    pub hover: Option<Hover>,
}

impl AppState {
    pub fn initial(config: &MapConfig) -> Self {
        Self {
            year: config.clamp_year(config.initial_year),
            view: config.initial_view,
            dataset: Arc::new(Dataset::default()),
            classification: Arc::from(Vec::new()),
            hover: None,
        }
    }

    pub fn classification_of(&self, feature_id: &str) -> Option<Classification> {
        let idx = self.dataset.position(feature_id)?;
        self.classification.get(idx).copied()
    }

    /// Tooltip content for the hovered country, derived from the current year
    /// so it follows year changes while the pointer stays put.
    pub fn tooltip(&self, config: &MapConfig) -> Option<Tooltip> {
        let hover = self.hover.as_ref()?;
        let idx = self.dataset.position(&hover.feature_id)?;
        let feature = &self.dataset.features[idx];
        let class = self.classification.get(idx).copied().unwrap_or_default();
        Some(Tooltip {
            name: feature.name().to_string(),
            year: self.year,
            emissions: feature.emissions(self.year),
            percentile: class.percentile(config.color_stops()),
            rank: class.rank,
            x: hover.x,
            y: hover.y,
        })
    }
}

/// Apply `action` to `state`, returning the next state.
pub fn reduce(state: &AppState, action: Action, config: &MapConfig) -> AppState {
    match action {
        Action::DatasetLoaded(dataset) => {
            let classification = classify(&dataset, state.year, config);
            tracing::debug!(features = dataset.len(), year = state.year, "dataset loaded");
            AppState {
                dataset,
                classification,
                ..state.clone()
            }
        }
        Action::YearSelected(year) => {
            let year = config.clamp_year(year);
            if year == state.year {
                return state.clone();
            }
            AppState {
                year,
                classification: classify(&state.dataset, year, config),
                ..state.clone()
            }
        }
        Action::ViewChanged(view) => AppState {
            view,
            ..state.clone()
        },
        Action::Hovered { feature_id, x, y } => AppState {
            hover: feature_id.map(|feature_id| Hover { feature_id, x, y }),
            ..state.clone()
        },
        Action::HoverCleared => AppState {
            hover: None,
            ..state.clone()
        },
    }
}

fn classify(dataset: &Dataset, year: i32, config: &MapConfig) -> Arc<[Classification]> {
    Arc::from(classify_year(dataset, year, config.color_stops()))
}

// ── Tooltip ───────────────────────────────────────────────────────────────────

pub const NO_DATA_LABEL: &str = "No data.";
pub const EMISSIONS_UNIT: &str = "kt of CO2 equivalent";

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub name: String,
    pub year: i32,
    pub emissions: YearValue,
    pub percentile: Option<u32>,
    pub rank: Option<usize>,
    pub x: f64,
    pub y: f64,
}

impl Tooltip {
    pub fn title(&self) -> String {
        format!("{} ({})", self.name, self.year)
    }

    pub fn emissions_label(&self) -> String {
        match self.emissions {
            YearValue::Present(v) => format!("Methane emissions: {v} ({EMISSIONS_UNIT})"),
            YearValue::NoData => format!("Methane emissions: {NO_DATA_LABEL}"),
        }
    }

    pub fn percentile_label(&self) -> String {
        match self.percentile {
            Some(p) => format!("Percentile: {p}"),
            None => format!("Percentile: {NO_DATA_LABEL}"),
        }
    }

    pub fn rank_label(&self) -> String {
        match self.rank {
            Some(r) => format!("Country Rank: {}", ordinal(r)),
            None => format!("Country Rank: {NO_DATA_LABEL}"),
        }
    }

    pub fn lines(&self) -> [String; 4] {
        [
            self.title(),
            self.emissions_label(),
            self.percentile_label(),
            self.rank_label(),
        ]
    }
}

impl fmt::Display for Tooltip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}
