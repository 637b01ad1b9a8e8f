use crate::erddap::{Table, TableQuery};

/// Common error type for loading and merging.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid service url: {0}")]
    Url(String),
    #[error("csv decoding failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("json decoding failure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed table: {0}")]
    MalformedTable(String),
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
    #[error("missing variable `{0}`")]
    MissingVariable(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no raw dataset identifier for `{0}`")]
    NoRawDataset(String),
    #[error("acoustic dataset has no pings")]
    EmptyAcoustic,
    #[error("no glider samples between {start} and {end}")]
    NoGliderCoverage { start: f64, end: f64 },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Anything that can answer a tabular dataset request.
///
/// The ERDDAP client is the production implementation; tests substitute
/// in-memory tables.
pub trait TabularSource {
    fn fetch(&self, query: &TableQuery) -> PipelineResult<Table>;
}

impl<T: TabularSource + ?Sized> TabularSource for &T {
    fn fetch(&self, query: &TableQuery) -> PipelineResult<Table> {
        (**self).fetch(query)
    }
}
