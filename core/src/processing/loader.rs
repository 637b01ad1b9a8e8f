use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::GliderSeries;
use crate::erddap::TableQuery;
use crate::math::interp;
use crate::prelude::{PipelineError, PipelineResult, TabularSource};
use crate::telemetry::log::LogManager;

/// What to fetch and how to derive the seafloor estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Science (profile) dataset.
    pub dataset_id: String,
    /// Raw/trajectory dataset carrying water depth. When unset, the Rutgers
    /// `profile-sci` -> `trajectory-raw` naming convention is applied.
    pub raw_dataset_id: Option<String>,
    /// Science variables to request; empty requests all of them.
    pub variables: Vec<String>,
    pub time_variable: String,
    /// Variables flagged as coordinates on the loaded series.
    pub coordinate_variables: Vec<String>,
    pub water_depth_variable: String,
    pub raw_pitch_variable: String,
    /// Water depths at or below this many metres are sensor noise.
    pub min_water_depth: f64,
    /// Name under which the seafloor estimate is attached.
    pub bottom_depth_variable: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            dataset_id: "ru32-20190102T1317-profile-sci-rt".into(),
            raw_dataset_id: None,
            variables: Vec::new(),
            time_variable: "time".into(),
            coordinate_variables: vec!["latitude".into(), "longitude".into(), "depth".into()],
            water_depth_variable: "m_water_depth".into(),
            raw_pitch_variable: "m_pitch".into(),
            min_water_depth: 10.0,
            bottom_depth_variable: "bottom_depth".into(),
            start: None,
            end: None,
        }
    }
}

impl LoaderConfig {
    pub fn resolve_raw_dataset_id(&self) -> PipelineResult<String> {
        match &self.raw_dataset_id {
            Some(id) => Ok(id.clone()),
            None => conventional_raw_dataset_id(&self.dataset_id)
                .ok_or_else(|| PipelineError::NoRawDataset(self.dataset_id.clone())),
        }
    }

    fn science_query(&self) -> TableQuery {
        let mut variables = self.variables.clone();
        if !variables.is_empty() && !variables.contains(&self.time_variable) {
            variables.insert(0, self.time_variable.clone());
        }
        TableQuery::new(self.dataset_id.clone())
            .with_variables(variables)
            .with_time_bounds(&self.time_variable, self.start, self.end)
    }

    fn raw_query(&self, raw_dataset_id: &str) -> TableQuery {
        TableQuery::new(raw_dataset_id)
            .with_variables([
                self.time_variable.as_str(),
                self.water_depth_variable.as_str(),
                self.raw_pitch_variable.as_str(),
            ])
            .with_time_bounds(&self.time_variable, self.start, self.end)
    }
}

/// Sibling raw dataset under the Rutgers naming scheme, if `dataset_id`
/// follows it.
pub fn conventional_raw_dataset_id(dataset_id: &str) -> Option<String> {
    dataset_id
        .contains("profile-sci")
        .then(|| dataset_id.replacen("profile-sci", "trajectory-raw", 1))
}

/// Fetches a glider deployment and attaches the seafloor depth seen by the
/// vehicle's altimeter.
pub struct GliderLoader<S> {
    source: S,
    config: LoaderConfig,
    logger: LogManager,
}

impl<S: TabularSource> GliderLoader<S> {
    pub fn new(source: S, config: LoaderConfig) -> Self {
        Self {
            source,
            config,
            logger: LogManager::new("loader"),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn load(&self) -> PipelineResult<GliderSeries> {
        let config = &self.config;
        let raw_dataset_id = config.resolve_raw_dataset_id()?;
        let table = self.source.fetch(&config.science_query())?;
        let mut series = GliderSeries::from_table(&table, &config.time_variable)?
            .with_coordinates(&config.coordinate_variables);
        self.logger.record(&format!(
            "{}: {} rows -> {} unique timestamps",
            config.dataset_id,
            table.num_rows(),
            series.len()
        ));

        let raw = self.load_raw(&raw_dataset_id)?;
        let water_depth = raw.require(&config.water_depth_variable)?;
        let bottom_depth =
            interp::nearest(raw.time().view(), water_depth.view(), series.time().view());
        series.insert_variable(&config.bottom_depth_variable, bottom_depth)?;

        Ok(series)
    }

    /// The raw stream with implausible water depths removed.
    pub fn load_raw(&self, raw_dataset_id: &str) -> PipelineResult<GliderSeries> {
        let config = &self.config;
        let table = self.source.fetch(&config.raw_query(raw_dataset_id))?;
        let raw = GliderSeries::from_table(&table, &config.time_variable)?;

        let floor = config.min_water_depth;
        let valid = raw.filter_by(&config.water_depth_variable, |depth| depth > floor)?;
        self.logger.record(&format!(
            "{}: kept {} of {} water depth readings above {} m",
            raw_dataset_id,
            valid.len(),
            raw.len(),
            floor
        ));
        if valid.is_empty() {
            self.logger
                .warn("no usable water depth readings; bottom depth will be missing");
        }
        Ok(valid)
    }
}
