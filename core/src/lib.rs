//! Core loading and co-registration logic for glider / AZFP echosounder data.
//!
//! Glider telemetry is pulled from an ERDDAP tabledap service, re-indexed onto
//! a timestamp axis, and resampled onto acoustic ping times so every range bin
//! carries a physical depth and every ping an along-track distance.

pub mod dataset;
pub mod erddap;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use dataset::{AcousticDataset, GliderSeries, MergedDataset};
pub use prelude::{PipelineError, PipelineResult, TabularSource};
pub use processing::{GliderLoader, LoaderConfig, MergeConfig, Merger};
