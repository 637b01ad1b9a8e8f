use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::dataset::{AcousticDataset, FrequencySelector, GliderSeries, MergedDataset};
use crate::math::{distances_from, interp, StatsHelper};
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;

/// Settings for co-registering glider telemetry with echosounder pings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    /// Lower pitch bound in degrees, exclusive.
    pub min_pitch: f64,
    /// Upper pitch bound in degrees, exclusive.
    pub max_pitch: f64,
    /// Glider variables carried onto the ping axis.
    pub variables: Vec<String>,
    pub reference_frequency: FrequencySelector,
    pub depth_variable: String,
    /// Pitch in radians.
    pub pitch_variable: String,
    pub latitude_variable: String,
    pub longitude_variable: String,
    pub bottom_depth_variable: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_pitch: -90.0,
            max_pitch: 0.0,
            variables: [
                "depth",
                "latitude",
                "longitude",
                "pitch",
                "roll",
                "temperature",
                "salinity",
                "chlorophyll_a",
                "bottom_depth",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            reference_frequency: FrequencySelector::default(),
            depth_variable: "depth".into(),
            pitch_variable: "pitch".into(),
            latitude_variable: "latitude".into(),
            longitude_variable: "longitude".into(),
            bottom_depth_variable: "bottom_depth".into(),
        }
    }
}

/// Aligns a glider series with an acoustic dataset on ping time.
pub struct Merger {
    config: MergeConfig,
    logger: LogManager,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("merge"),
        }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn merge(
        &self,
        glider: &GliderSeries,
        acoustic: &AcousticDataset,
    ) -> PipelineResult<MergedDataset> {
        let config = &self.config;
        acoustic.validate()?;
        let (start, end) = acoustic.ping_span().ok_or(PipelineError::EmptyAcoustic)?;

        let window = glider.select_time_range(start, end);
        if window.is_empty() {
            return Err(PipelineError::NoGliderCoverage { start, end });
        }
        let mut window = window.select_variables(&config.variables)?;
        for name in &config.variables {
            if window.promote_coordinate(name) {
                self.logger.detail(&format!("promoted coordinate `{}`", name));
            }
        }
        for required in [
            &config.depth_variable,
            &config.pitch_variable,
            &config.latitude_variable,
            &config.longitude_variable,
        ] {
            window.require(required)?;
        }
        self.logger.record(&format!(
            "{} glider samples inside {} pings",
            window.len(),
            acoustic.num_pings()
        ));

        if let Some(bottom) = window.variable(&config.bottom_depth_variable) {
            let valid = StatsHelper::count_valid(&bottom.to_vec());
            let filled = fill_bottom_depth(
                bottom.view(),
                window.require(&config.depth_variable)?.view(),
            );
            self.logger
                .detail(&format!("{} bottom depth samples in window", valid));
            window.insert_variable(&config.bottom_depth_variable, filled)?;
        }

        let mut ping_fields = acoustic.ping_fields.clone();
        for (name, values) in window.variables() {
            let filled = interp::fill_gaps(window.time().view(), values.view());
            let resampled =
                interp::linear(window.time().view(), filled.view(), acoustic.ping_time.view());
            if resampled.iter().any(|v| v.is_nan()) {
                self.logger
                    .warn(&format!("`{}` has no valid samples in the ping span", name));
            }
            if ping_fields.insert(name.clone(), resampled).is_some() {
                self.logger
                    .detail(&format!("filled acoustic placeholder `{}`", name));
            }
        }

        let (reference_frequency, range_row) = acoustic.range_row(config.reference_frequency)?;
        let depth = ping_fields
            .get(&config.depth_variable)
            .ok_or_else(|| PipelineError::MissingVariable(config.depth_variable.clone()))?;
        let bin_depth = bin_depths(depth.view(), range_row);

        let merged = MergedDataset {
            ping_time: acoustic.ping_time.clone(),
            frequency: acoustic.frequency.clone(),
            range: acoustic.range.clone(),
            reference_frequency,
            measurements: acoustic.measurements.clone(),
            ping_fields,
            bin_depth,
            distance: Array1::from_elem(acoustic.num_pings(), f64::NAN),
        };

        let pitch = merged
            .ping_field(&config.pitch_variable)
            .ok_or_else(|| PipelineError::MissingVariable(config.pitch_variable.clone()))?;
        let kept = pitch_window(pitch.view(), config.min_pitch, config.max_pitch);
        let mut merged = merged.select_pings(&kept);
        self.logger.record(&format!(
            "kept {} of {} pings with pitch in ({}, {}) deg",
            merged.num_pings(),
            acoustic.num_pings(),
            config.min_pitch,
            config.max_pitch
        ));

        let latitude = merged
            .ping_field(&config.latitude_variable)
            .ok_or_else(|| PipelineError::MissingVariable(config.latitude_variable.clone()))?;
        let longitude = merged
            .ping_field(&config.longitude_variable)
            .ok_or_else(|| PipelineError::MissingVariable(config.longitude_variable.clone()))?;
        merged.distance = along_track_distance(latitude.view(), longitude.view());

        Ok(merged)
    }
}

/// Seafloor estimate for a window with too few altimeter hits.
///
/// No valid samples: the deepest glider depth stands in for the bottom. One
/// or two: their mean is broadcast. Three or more: returned unchanged.
pub fn fill_bottom_depth(bottom: ArrayView1<f64>, depth: ArrayView1<f64>) -> Array1<f64> {
    let samples = bottom.to_vec();
    match StatsHelper::count_valid(&samples) {
        0 => {
            let deepest = StatsHelper::nan_max(&depth.to_vec()).unwrap_or(f64::NAN);
            Array1::from_elem(bottom.len(), deepest)
        }
        1 | 2 => {
            let mean = StatsHelper::nan_mean(&samples).unwrap_or(f64::NAN);
            Array1::from_elem(bottom.len(), mean)
        }
        _ => bottom.to_owned(),
    }
}

/// Depth of every range bin at every ping for a downward-looking transducer:
/// `bin_depth[t, r] = range[r] + depth[t]`.
pub fn bin_depths(depth: ArrayView1<f64>, range: ArrayView1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((depth.len(), range.len()), |(t, r)| range[r] + depth[t])
}

/// Indices whose pitch, converted from radians, lies strictly inside
/// `(min_deg, max_deg)`. Missing pitch never qualifies.
pub fn pitch_window(pitch_rad: ArrayView1<f64>, min_deg: f64, max_deg: f64) -> Vec<usize> {
    pitch_rad
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            let deg = p.to_degrees();
            deg > min_deg && deg < max_deg
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Distance of every fix from the first one.
pub fn along_track_distance(
    latitude: ArrayView1<f64>,
    longitude: ArrayView1<f64>,
) -> Array1<f64> {
    match (latitude.first(), longitude.first()) {
        (Some(&lat), Some(&lon)) => distances_from(latitude, longitude, (lat, lon)),
        _ => Array1::zeros(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};
    use std::collections::BTreeMap;

    const VARIABLES: [&str; 6] = [
        "depth",
        "latitude",
        "longitude",
        "pitch",
        "bottom_depth",
        "temperature",
    ];

    fn config(min_pitch: f64, max_pitch: f64) -> MergeConfig {
        MergeConfig {
            min_pitch,
            max_pitch,
            variables: VARIABLES.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }
    }

    fn glider(time: Array1<f64>, columns: &[(&str, Array1<f64>)]) -> GliderSeries {
        let variables: BTreeMap<String, Array1<f64>> = columns
            .iter()
            .map(|(name, values)| (name.to_string(), values.clone()))
            .collect();
        GliderSeries::new(time, variables)
            .unwrap()
            .with_coordinates(["latitude", "longitude", "depth"])
    }

    fn steady_glider(pitch: Array1<f64>, depth: Array1<f64>) -> GliderSeries {
        glider(
            array![10.0, 20.0, 30.0],
            &[
                ("depth", depth),
                ("latitude", array![39.0, 39.001, 39.002]),
                ("longitude", array![-74.0, -74.0, -74.0]),
                ("pitch", pitch),
                ("bottom_depth", array![40.0, 41.0, 42.0]),
                ("temperature", array![10.0, 11.0, 12.0]),
            ],
        )
    }

    fn acoustic() -> AcousticDataset {
        AcousticDataset::new(
            array![10.0, 20.0, 30.0],
            array![38_000.0, 125_000.0],
            array![[1.0, 2.0], [1.0, 2.0]],
        )
        .unwrap()
        .with_measurement("Sv", Array3::from_elem((2, 3, 2), -70.0))
        .unwrap()
    }

    #[test]
    fn bin_depth_adds_range_to_glider_depth() {
        let g = steady_glider(array![-0.4, -0.4, -0.4], array![5.0, 5.0, 5.0]);
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &acoustic()).unwrap();
        assert_eq!(merged.reference_frequency, 125_000.0);
        assert_eq!(merged.bin_depth, array![[6.0, 7.0], [6.0, 7.0], [6.0, 7.0]]);
    }

    #[test]
    fn bin_depth_identity_holds_for_varying_depth() {
        let g = steady_glider(array![-0.4, -0.4, -0.4], array![3.0, 8.5, 14.25]);
        let ds = acoustic();
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &ds).unwrap();
        let depth = merged.ping_field("depth").unwrap();
        let (_, range) = ds.range_row(FrequencySelector::Index(1)).unwrap();
        for t in 0..merged.num_pings() {
            for r in 0..merged.num_range_bins() {
                assert_eq!(merged.bin_depth[[t, r]], range[r] + depth[t]);
            }
        }
    }

    #[test]
    fn pitch_filter_keeps_only_pings_inside_window() {
        let g = steady_glider(array![-0.1, -0.5, 0.05], array![5.0, 5.0, 5.0]);
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &acoustic()).unwrap();
        assert_eq!(merged.ping_time.to_vec(), vec![20.0]);
        assert_eq!(merged.measurements["Sv"].dim(), (2, 1, 2));
        assert_eq!(merged.bin_depth.dim(), (1, 2));
        assert_eq!(merged.distance.to_vec(), vec![0.0]);
        for pitch in merged.ping_field("pitch").unwrap() {
            let deg = pitch.to_degrees();
            assert!(deg > -30.0 && deg < -15.0);
        }
    }

    #[test]
    fn pitch_window_is_strict() {
        let pitch = [-0.5_f64, -0.3, f64::NAN, -0.1];
        let kept = pitch_window(
            ndarray::aview1(&pitch),
            (-0.5_f64).to_degrees(),
            (-0.1_f64).to_degrees(),
        );
        assert_eq!(kept, vec![1]);
    }

    #[test]
    fn empty_pitch_window_yields_empty_dataset() {
        let g = steady_glider(array![0.2, 0.2, 0.2], array![5.0, 5.0, 5.0]);
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &acoustic()).unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.bin_depth.dim(), (0, 2));
        assert_eq!(merged.measurements["Sv"].dim(), (2, 0, 2));
        assert!(merged.distance.is_empty());
    }

    #[test]
    fn distance_starts_at_zero_and_grows_along_track() {
        let g = steady_glider(array![-0.4, -0.4, -0.4], array![5.0, 5.0, 5.0]);
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &acoustic()).unwrap();
        assert_eq!(merged.distance[0], 0.0);
        assert!((merged.distance[2] - 222.4).abs() < 1.0);
    }

    #[test]
    fn gaps_are_filled_and_edges_extrapolated() {
        let g = glider(
            array![10.0, 20.0, 30.0],
            &[
                ("depth", array![f64::NAN, 6.0, 8.0]),
                ("latitude", array![39.0, f64::NAN, 39.0]),
                ("longitude", array![-74.0, -74.0, f64::NAN]),
                ("pitch", array![-0.4, -0.4, -0.4]),
                ("bottom_depth", array![40.0, 41.0, 42.0]),
                ("temperature", array![f64::NAN, 11.0, f64::NAN]),
            ],
        );
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &acoustic()).unwrap();
        for values in merged.ping_fields.values() {
            assert!(values.iter().all(|v| v.is_finite()));
        }
        assert_eq!(merged.ping_field("depth").unwrap().to_vec(), vec![4.0, 6.0, 8.0]);
        assert_eq!(merged.ping_field("temperature").unwrap().to_vec(), vec![11.0, 11.0, 11.0]);
    }

    #[test]
    fn glider_samples_outside_ping_span_are_ignored() {
        let g = glider(
            array![0.0, 10.0, 30.0, 40.0],
            &[
                ("depth", array![100.0, 5.0, 5.0, 100.0]),
                ("latitude", array![39.0, 39.0, 39.0, 39.0]),
                ("longitude", array![-74.0, -74.0, -74.0, -74.0]),
                ("pitch", array![-0.4, -0.4, -0.4, -0.4]),
                ("bottom_depth", array![40.0, 40.0, 40.0, 40.0]),
                ("temperature", array![1.0, 1.0, 1.0, 1.0]),
            ],
        );
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &acoustic()).unwrap();
        assert_eq!(merged.ping_field("depth").unwrap().to_vec(), vec![5.0, 5.0, 5.0]);
    }

    #[test]
    fn sparse_bottom_depth_uses_max_depth_or_mean() {
        let depth = array![5.0, 12.0, f64::NAN, 8.0];

        let none = fill_bottom_depth(array![f64::NAN, f64::NAN, f64::NAN, f64::NAN].view(), depth.view());
        assert_eq!(none.to_vec(), vec![12.0; 4]);

        let one = array![f64::NAN, 40.0, f64::NAN, f64::NAN];
        let one = fill_bottom_depth(one.view(), depth.view());
        assert_eq!(one.to_vec(), vec![40.0; 4]);

        let two = fill_bottom_depth(array![f64::NAN, 40.0, 50.0, f64::NAN].view(), depth.view());
        assert_eq!(two.to_vec(), vec![45.0; 4]);

        let three = fill_bottom_depth(array![30.0, f64::NAN, 50.0, 70.0].view(), depth.view());
        assert_eq!(three[0], 30.0);
        assert!(three[1].is_nan());
        assert_eq!(three[3], 70.0);
    }

    #[test]
    fn missing_bottom_depth_falls_back_to_deepest_dive() {
        let g = glider(
            array![10.0, 20.0, 30.0],
            &[
                ("depth", array![5.0, 12.0, 8.0]),
                ("latitude", array![39.0, 39.0, 39.0]),
                ("longitude", array![-74.0, -74.0, -74.0]),
                ("pitch", array![-0.4, -0.4, -0.4]),
                ("bottom_depth", array![f64::NAN, f64::NAN, f64::NAN]),
                ("temperature", array![1.0, 1.0, 1.0]),
            ],
        );
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &acoustic()).unwrap();
        assert_eq!(merged.ping_field("bottom_depth").unwrap().to_vec(), vec![12.0; 3]);
    }

    #[test]
    fn acoustic_placeholders_are_replaced() {
        let g = steady_glider(array![-0.4, -0.4, -0.4], array![5.0, 5.0, 5.0]);
        let ds = acoustic()
            .with_ping_field("pitch", array![f64::NAN, f64::NAN, f64::NAN])
            .unwrap()
            .with_ping_field("tilt_x", array![1.0, 2.0, 3.0])
            .unwrap();
        let merged = Merger::new(config(-30.0, -15.0)).merge(&g, &ds).unwrap();
        assert_eq!(merged.ping_field("pitch").unwrap().to_vec(), vec![-0.4; 3]);
        assert_eq!(merged.ping_field("tilt_x").unwrap().to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_acoustic_dataset_is_an_error() {
        let g = steady_glider(array![-0.4, -0.4, -0.4], array![5.0, 5.0, 5.0]);
        let ds = AcousticDataset::new(
            Array1::zeros(0),
            array![38_000.0, 125_000.0],
            Array2::zeros((2, 4)),
        )
        .unwrap();
        let err = Merger::new(config(-30.0, -15.0)).merge(&g, &ds).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyAcoustic));
    }

    #[test]
    fn pings_outside_deployment_are_an_error() {
        let g = steady_glider(array![-0.4, -0.4, -0.4], array![5.0, 5.0, 5.0]);
        let ds = AcousticDataset::new(
            array![100.0, 200.0],
            array![38_000.0, 125_000.0],
            Array2::zeros((2, 4)),
        )
        .unwrap();
        let err = Merger::new(config(-30.0, -15.0)).merge(&g, &ds).unwrap_err();
        assert!(matches!(err, PipelineError::NoGliderCoverage { .. }));
    }

    #[test]
    fn unknown_variable_is_reported() {
        let g = steady_glider(array![-0.4, -0.4, -0.4], array![5.0, 5.0, 5.0]);
        let mut cfg = config(-30.0, -15.0);
        cfg.variables.push("salinity".into());
        let err = Merger::new(cfg).merge(&g, &acoustic()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingVariable(name) if name == "salinity"));
    }
}
