use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

use crate::erddap::table::{parse_number, parse_timestamp, Table};
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;

/// Time-indexed glider telemetry.
///
/// `time` holds seconds since the Unix epoch and is strictly increasing.
/// Every variable has one sample per timestamp; NaN marks a missing reading.
/// Variables named in `coordinates` describe where a sample was taken rather
/// than what was measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GliderSeries {
    time: Array1<f64>,
    variables: BTreeMap<String, Array1<f64>>,
    coordinates: BTreeSet<String>,
}

impl GliderSeries {
    /// Build a series from samples in observation order. Rows are sorted by
    /// time and exact duplicate timestamps collapse onto their first row.
    pub fn new(
        time: Array1<f64>,
        variables: BTreeMap<String, Array1<f64>>,
    ) -> PipelineResult<Self> {
        if time.iter().any(|t| !t.is_finite()) {
            return Err(PipelineError::InvalidInput(
                "timestamps must be finite".into(),
            ));
        }
        for (name, values) in &variables {
            if values.len() != time.len() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "`{}` has {} samples for {} timestamps",
                    name,
                    values.len(),
                    time.len()
                )));
            }
        }

        let order = ascending_unique_order(&time);
        let dropped = time.len() - order.len();
        if dropped > 0 {
            LogManager::new("series")
                .detail(&format!("dropped {} duplicate timestamps", dropped));
        }

        Ok(Self {
            time: time.select(Axis(0), &order),
            variables: variables
                .into_iter()
                .map(|(name, values)| (name, values.select(Axis(0), &order)))
                .collect(),
            coordinates: BTreeSet::new(),
        })
    }

    /// Swap a table's observation dimension for its time column.
    ///
    /// Columns that do not parse as numbers (trajectory names, platform ids)
    /// are left out.
    pub fn from_table(table: &Table, time_variable: &str) -> PipelineResult<Self> {
        let time_cells = table
            .column(time_variable)
            .ok_or_else(|| PipelineError::MissingVariable(time_variable.to_string()))?;
        let time = time_cells
            .iter()
            .map(|cell| parse_timestamp(cell))
            .collect::<PipelineResult<Vec<f64>>>()?;

        let logger = LogManager::new("series");
        let mut variables = BTreeMap::new();
        for name in table.names().iter().filter(|n| n.as_str() != time_variable) {
            let cells = table.column(name).unwrap_or_default();
            match cells.iter().map(|c| parse_number(c)).collect::<Option<Vec<f64>>>() {
                Some(values) => {
                    variables.insert(name.clone(), Array1::from_vec(values));
                }
                None => logger.detail(&format!("skipping non-numeric column `{}`", name)),
            }
        }

        Self::new(Array1::from_vec(time), variables)
    }

    /// Flag the named variables (those present) as coordinates.
    pub fn with_coordinates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if self.variables.contains_key(name) {
                self.coordinates.insert(name.to_string());
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn time_span(&self) -> Option<(f64, f64)> {
        Some((*self.time.first()?, *self.time.last()?))
    }

    pub fn variable(&self, name: &str) -> Option<&Array1<f64>> {
        self.variables.get(name)
    }

    pub fn require(&self, name: &str) -> PipelineResult<&Array1<f64>> {
        self.variable(name)
            .ok_or_else(|| PipelineError::MissingVariable(name.to_string()))
    }

    pub fn variables(&self) -> &BTreeMap<String, Array1<f64>> {
        &self.variables
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn coordinates(&self) -> &BTreeSet<String> {
        &self.coordinates
    }

    pub fn is_coordinate(&self, name: &str) -> bool {
        self.coordinates.contains(name)
    }

    /// Turn a coordinate into an ordinary field. Returns whether it was one.
    pub fn promote_coordinate(&mut self, name: &str) -> bool {
        self.coordinates.remove(name)
    }

    /// Add or replace a variable aligned with the time axis.
    pub fn insert_variable(&mut self, name: &str, values: Array1<f64>) -> PipelineResult<()> {
        if values.len() != self.time.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "`{}` has {} samples for {} timestamps",
                name,
                values.len(),
                self.time.len()
            )));
        }
        self.variables.insert(name.to_string(), values);
        Ok(())
    }

    /// Rows with `start <= time <= end`.
    pub fn select_time_range(&self, start: f64, end: f64) -> Self {
        let rows: Vec<usize> = self
            .time
            .iter()
            .enumerate()
            .filter(|(_, &t)| t >= start && t <= end)
            .map(|(idx, _)| idx)
            .collect();
        self.select_rows(&rows)
    }

    /// Rows whose `name` value satisfies `keep`. Missing values are offered
    /// to `keep` as NaN.
    pub fn filter_by<F>(&self, name: &str, keep: F) -> PipelineResult<Self>
    where
        F: Fn(f64) -> bool,
    {
        let rows: Vec<usize> = self
            .require(name)?
            .iter()
            .enumerate()
            .filter(|(_, &v)| keep(v))
            .map(|(idx, _)| idx)
            .collect();
        Ok(self.select_rows(&rows))
    }

    /// Keep only the named variables; every name must exist.
    pub fn select_variables<S: AsRef<str>>(&self, names: &[S]) -> PipelineResult<Self> {
        let mut variables = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            variables.insert(name.to_string(), self.require(name)?.clone());
        }
        let coordinates = self
            .coordinates
            .iter()
            .filter(|c| variables.contains_key(c.as_str()))
            .cloned()
            .collect();
        Ok(Self {
            time: self.time.clone(),
            variables,
            coordinates,
        })
    }

    fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            time: self.time.select(Axis(0), rows),
            variables: self
                .variables
                .iter()
                .map(|(name, values)| (name.clone(), values.select(Axis(0), rows)))
                .collect(),
            coordinates: self.coordinates.clone(),
        }
    }
}

fn ascending_unique_order(time: &Array1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..time.len()).collect();
    order.sort_by(|&a, &b| time[a].total_cmp(&time[b]));
    order.dedup_by(|later, earlier| time[*later] == time[*earlier]);
    order
}
