//! Single owner of the application state.
//!
//! The host feeds user events in as [`Action`]s together with the current time
//! and carries out the returned [`Effect`]s. The controller itself performs no
//! I/O.

use std::sync::Arc;

use serde_json::Value;

use crate::config::MapConfig;
use crate::dataset::Dataset;
use crate::debounce::Debouncer;
use crate::error::DatasetError;
use crate::layer::{layer_collection, FillLayer};
use crate::route::Route;
use crate::state::{reduce, Action, AppState, Tooltip};

/// Side effects requested from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the current history entry with this path and query.
    ReplaceUrl(String),
}

#[derive(Debug, Clone)]
pub struct Controller {
    config: MapConfig,
    state: AppState,
    url_sync: Debouncer<String>,
}

impl Controller {
    pub fn new(config: MapConfig) -> Self {
        let state = AppState::initial(&config);
        let url_sync = Debouncer::new(config.debounce_ms);
        Self {
            config,
            state,
            url_sync,
        }
    }

    /// Start from a URL: its year and view (when complete) override the defaults.
    pub fn from_location(config: MapConfig, location: &str) -> Self {
        let mut controller = Self::new(config);
        let route = Route::parse(location);
        let mut state = controller.state.clone();
        if let Some(year) = route.year {
            state.year = controller.config.clamp_year(year);
        }
        state.view = route.apply_to(state.view);
        tracing::debug!(year = state.year, ?route, "initialised from location");
        controller.state = state;
        controller
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// URL describing the current year and view.
    pub fn current_url(&self) -> String {
        Route::from_view(self.state.year, &self.state.view).to_url(&self.config.base_path)
    }

    /// Apply `action`. A year change rewrites the URL at once; view changes are
    /// coalesced and surface later through [`Controller::poll`].
    pub fn dispatch(&mut self, action: Action, now_ms: u64) -> Vec<Effect> {
        let is_view_change = matches!(action, Action::ViewChanged(_));
        let next = reduce(&self.state, action, &self.config);
        let year_changed = next.year != self.state.year;
        self.state = next;

        let mut effects = Vec::new();
        if year_changed {
            // A pending view URL still names the previous year.
            self.url_sync.cancel();
            effects.push(Effect::ReplaceUrl(self.current_url()));
        } else if is_view_change {
            self.url_sync.call(self.current_url(), now_ms);
        }
        effects
    }

    /// Release the debounced URL update once its window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<Effect> {
        self.url_sync.poll(now_ms).map(Effect::ReplaceUrl)
    }

    /// Deadline of the pending URL update, for hosts that schedule a timer.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.url_sync.deadline_ms()
    }

    /// Decode fetched dataset text and load it. On error the current dataset
    /// is kept and the error is returned to the caller.
    pub fn load_dataset_json(&mut self, json: &str, now_ms: u64) -> Result<Vec<Effect>, DatasetError> {
        let dataset = Dataset::from_json_str(json)?;
        tracing::info!(features = dataset.len(), "dataset decoded");
        Ok(self.dispatch(Action::DatasetLoaded(Arc::new(dataset)), now_ms))
    }

    pub fn layer(&self) -> Value {
        layer_collection(&self.state)
    }

    pub fn fill_layer(&self) -> FillLayer {
        FillLayer::from_config(&self.config)
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        self.state.tooltip(&self.config)
    }

    /// Where the host should fetch the combined dataset from.
    pub fn data_url(prod: bool) -> &'static str {
        MapConfig::data_url(prod)
    }
}
