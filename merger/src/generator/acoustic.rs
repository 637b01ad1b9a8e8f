use anyhow::{ensure, Context};
use glidercore::AcousticDataset;
use ndarray::{Array1, Array2, Array3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating a stand-in AZFP dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyntheticConfig {
    pub ping_interval_s: f64,
    pub frequencies: Vec<f64>,
    pub range_bins: usize,
    pub bin_size_m: f64,
    pub noise_db: f64,
    pub seed: u64,
    /// Upper bound on generated pings; longer spans need a coarser interval.
    pub max_pings: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            ping_interval_s: 1.0,
            frequencies: vec![67_000.0, 125_000.0, 200_000.0, 455_000.0],
            range_bins: 200,
            bin_size_m: 0.25,
            noise_db: 3.0,
            seed: 0,
            max_pings: 20_000,
        }
    }
}

/// Pings every `ping_interval_s` from `start` through `end` (seconds since
/// the epoch), with `pitch` and `roll` left as placeholders for the merge.
pub fn build_acoustic(
    config: &SyntheticConfig,
    start: f64,
    end: f64,
) -> anyhow::Result<AcousticDataset> {
    ensure!(config.ping_interval_s > 0.0, "ping interval must be positive");
    ensure!(end >= start, "synthetic span ends before it starts");
    ensure!(!config.frequencies.is_empty(), "at least one frequency is required");

    let span_pings = ((end - start) / config.ping_interval_s).floor() + 1.0;
    ensure!(
        span_pings <= config.max_pings as f64,
        "{:.0} s at {} s per ping needs {:.0} pings, over the limit of {}; \
         raise synthetic.ping_interval_s or synthetic.max_pings",
        end - start,
        config.ping_interval_s,
        span_pings,
        config.max_pings
    );
    let pings = span_pings as usize;
    let channels = config.frequencies.len();
    let bins = config.range_bins.max(1);

    let ping_time = Array1::from_shape_fn(pings, |p| start + p as f64 * config.ping_interval_s);
    let range =
        Array2::from_shape_fn((channels, bins), |(_, r)| (r as f64 + 0.5) * config.bin_size_m);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let sv = Array3::from_shape_fn((channels, pings, bins), |(f, _, r)| {
        // Volume backscatter fades with range and, more steeply, with frequency.
        let attenuation = 0.02 * (f as f64 + 1.0) * range[[f, r]];
        let jitter = if config.noise_db > 0.0 {
            rng.gen_range(-config.noise_db..config.noise_db)
        } else {
            0.0
        };
        -70.0 - attenuation + jitter
    });

    AcousticDataset::new(ping_time, Array1::from_vec(config.frequencies.clone()), range)
        .and_then(|ds| ds.with_measurement("Sv", sv))
        .and_then(|ds| ds.with_ping_field("pitch", Array1::from_elem(pings, f64::NAN)))
        .and_then(|ds| ds.with_ping_field("roll", Array1::from_elem(pings, f64::NAN)))
        .context("assembling synthetic acoustic dataset")
}
