use thiserror::Error;

/// Failure reading the per-country emissions table.
#[derive(Debug, Error)]
pub enum TabularError {
    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected at least a name and a country code, found {cells} cell(s)")]
    ShortRow { line: u64, cells: usize },

    #[error("line {line}: empty country code")]
    MissingCode { line: u64 },

    #[error("line {line}, year {year}: {value:?} is not a finite number")]
    InvalidValue { line: u64, year: i32, value: String },

    #[error("line {line}: year column {column} after base year {base_year} is out of range")]
    YearOutOfRange { line: u64, base_year: i32, column: usize },

    #[error("line {line}: duplicate country code {code}")]
    DuplicateCode { line: u64, code: String },
}

/// Failure reading the country boundary collection.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("boundary JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a GeoJSON FeatureCollection, found type {0:?}")]
    NotAFeatureCollection(String),

    #[error("duplicate feature id {0}")]
    DuplicateId(String),
}

/// Failure decoding a combined (merged) dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a GeoJSON FeatureCollection, found type {0:?}")]
    NotAFeatureCollection(String),
}

/// Anything that stops the merge from producing output.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Tabular(#[from] TabularError),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error("serialising merged collection: {0}")]
    Serialize(#[from] serde_json::Error),
}
