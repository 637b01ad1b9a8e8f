use std::collections::BTreeMap;

use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::math::StatsHelper;

/// Acoustic data co-registered with glider telemetry on the ping-time axis.
///
/// `bin_depth` (`ping_time x range_bin`) and `distance` (`ping_time`) are
/// auxiliary coordinates: they vary with the main axes but do not index them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedDataset {
    pub ping_time: Array1<f64>,
    pub frequency: Array1<f64>,
    pub range: Array2<f64>,
    /// Frequency whose range axis produced `bin_depth`.
    pub reference_frequency: f64,
    pub measurements: BTreeMap<String, Array3<f64>>,
    pub ping_fields: BTreeMap<String, Array1<f64>>,
    pub bin_depth: Array2<f64>,
    pub distance: Array1<f64>,
}

impl MergedDataset {
    pub fn num_pings(&self) -> usize {
        self.ping_time.len()
    }

    pub fn num_range_bins(&self) -> usize {
        self.range.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.ping_time.is_empty()
    }

    pub fn ping_field(&self, name: &str) -> Option<&Array1<f64>> {
        self.ping_fields.get(name)
    }

    /// Largest distance from the first retained ping, in metres.
    pub fn track_extent(&self) -> Option<f64> {
        StatsHelper::nan_max(&self.distance.to_vec())
    }

    /// Keep only the given pings, in the given order, across every field.
    pub(crate) fn select_pings(&self, pings: &[usize]) -> Self {
        Self {
            ping_time: self.ping_time.select(Axis(0), pings),
            frequency: self.frequency.clone(),
            range: self.range.clone(),
            reference_frequency: self.reference_frequency,
            measurements: self
                .measurements
                .iter()
                .map(|(name, values)| (name.clone(), values.select(Axis(1), pings)))
                .collect(),
            ping_fields: self
                .ping_fields
                .iter()
                .map(|(name, values)| (name.clone(), values.select(Axis(0), pings)))
                .collect(),
            bin_depth: self.bin_depth.select(Axis(0), pings),
            distance: self.distance.select(Axis(0), pings),
        }
    }
}
