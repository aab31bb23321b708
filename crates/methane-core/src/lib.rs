//! Core of the methane emissions atlas: the build-time dataset merge and the
//! presentation-time classification, routing and state handling.

pub mod boundaries;
pub mod classify;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod debounce;
pub mod emissions;
pub mod error;
pub mod layer;
pub mod merge;
pub mod route;
pub mod state;

pub use classify::{classify_year, Classification, QuantileScale, RankTable};
pub use config::{MapConfig, ViewState};
pub use controller::{Controller, Effect};
pub use dataset::{CountryFeature, CountryProperties, Dataset};
pub use emissions::{EmissionsRecord, YearSeries, YearValue};
pub use error::{BoundaryError, DatasetError, MergeError, TabularError};
pub use merge::{merge, MergeReport};
pub use route::Route;
pub use state::{Action, AppState};
