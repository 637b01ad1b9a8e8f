use std::collections::BTreeMap;
use std::io::Read;

use ndarray::{Array1, Array2, Array3, ArrayView1};
use serde::{Deserialize, Serialize};

use super::nullable;
use crate::prelude::{PipelineError, PipelineResult};

/// Chooses which frequency's range axis converts range bins to depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum FrequencySelector {
    /// Position along the frequency axis.
    Index(usize),
    /// Nominal frequency in Hz, matched to within half a hertz.
    Nominal(f64),
}

impl Default for FrequencySelector {
    fn default() -> Self {
        FrequencySelector::Index(1)
    }
}

/// Calibrated echosounder output, as handed over by the caller.
///
/// * `ping_time`: seconds since the Unix epoch, ascending.
/// * `frequency`: Hz, one entry per transducer channel.
/// * `range`: metres from the transducer, `frequency x range_bin`.
/// * `measurements`: `frequency x ping_time x range_bin` grids (e.g. `Sv`).
/// * `ping_fields`: per-ping values such as `pitch`/`roll` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcousticDataset {
    pub ping_time: Array1<f64>,
    pub frequency: Array1<f64>,
    #[serde(deserialize_with = "nullable::array")]
    pub range: Array2<f64>,
    #[serde(default, deserialize_with = "nullable::array_map")]
    pub measurements: BTreeMap<String, Array3<f64>>,
    #[serde(default, deserialize_with = "nullable::array_map")]
    pub ping_fields: BTreeMap<String, Array1<f64>>,
}

impl AcousticDataset {
    pub fn new(
        ping_time: Array1<f64>,
        frequency: Array1<f64>,
        range: Array2<f64>,
    ) -> PipelineResult<Self> {
        let dataset = Self {
            ping_time,
            frequency,
            range,
            measurements: BTreeMap::new(),
            ping_fields: BTreeMap::new(),
        };
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn with_measurement(mut self, name: &str, values: Array3<f64>) -> PipelineResult<Self> {
        self.measurements.insert(name.to_string(), values);
        self.validate()?;
        Ok(self)
    }

    pub fn with_ping_field(mut self, name: &str, values: Array1<f64>) -> PipelineResult<Self> {
        self.ping_fields.insert(name.to_string(), values);
        self.validate()?;
        Ok(self)
    }

    /// Decode a JSON document (ndarray's serde layout) and check its shapes.
    /// `null` entries in ranges, measurements and ping fields read as NaN.
    pub fn from_json_reader<R: Read>(reader: R) -> PipelineResult<Self> {
        let dataset: Self = serde_json::from_reader(reader)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let (pings, bins) = (self.num_pings(), self.num_range_bins());
        if self.range.nrows() != self.frequency.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "range has {} rows for {} frequencies",
                self.range.nrows(),
                self.frequency.len()
            )));
        }
        if !self
            .ping_time
            .iter()
            .zip(self.ping_time.iter().skip(1))
            .all(|(a, b)| a <= b)
        {
            return Err(PipelineError::InvalidInput("ping_time must be ascending".into()));
        }
        for (name, values) in &self.measurements {
            if values.dim() != (self.frequency.len(), pings, bins) {
                return Err(PipelineError::ShapeMismatch(format!(
                    "`{}` is {:?}, expected {:?}",
                    name,
                    values.dim(),
                    (self.frequency.len(), pings, bins)
                )));
            }
        }
        for (name, values) in &self.ping_fields {
            if values.len() != pings {
                return Err(PipelineError::ShapeMismatch(format!(
                    "`{}` has {} values for {} pings",
                    name,
                    values.len(),
                    pings
                )));
            }
        }
        Ok(())
    }

    pub fn num_pings(&self) -> usize {
        self.ping_time.len()
    }

    pub fn num_range_bins(&self) -> usize {
        self.range.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.ping_time.is_empty()
    }

    /// First and last ping timestamps.
    pub fn ping_span(&self) -> Option<(f64, f64)> {
        Some((*self.ping_time.first()?, *self.ping_time.last()?))
    }

    /// The selected frequency and its range axis.
    pub fn range_row(
        &self,
        selector: FrequencySelector,
    ) -> PipelineResult<(f64, ArrayView1<'_, f64>)> {
        let index = match selector {
            FrequencySelector::Index(index) => index,
            FrequencySelector::Nominal(hz) => self
                .frequency
                .iter()
                .position(|f| (f - hz).abs() < 0.5)
                .ok_or_else(|| PipelineError::InvalidInput(format!("no {} Hz channel", hz)))?,
        };
        if index >= self.frequency.len() {
            return Err(PipelineError::InvalidInput(format!(
                "frequency index {} out of {} channels",
                index,
                self.frequency.len()
            )));
        }
        Ok((self.frequency[index], self.range.row(index)))
    }
}
