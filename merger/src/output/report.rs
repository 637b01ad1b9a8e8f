use anyhow::Context;
use chrono::{SecondsFormat, TimeZone, Utc};
use glidercore::MergedDataset;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::workflow::runner::WorkflowResult;

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn iso_time(seconds: f64) -> anyhow::Result<String> {
    let millis = (seconds * 1000.0).round() as i64;
    let time = Utc
        .timestamp_millis_opt(millis)
        .single()
        .with_context(|| format!("ping time {} is out of range", seconds))?;
    Ok(time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn summary(result: &WorkflowResult) -> String {
    let merged = &result.merged;
    format!(
        "glider samples {}, pings {} -> {} kept, range bins {}, reference {} Hz, track {:.1} m",
        result.glider_samples,
        result.pings_in,
        merged.num_pings(),
        merged.num_range_bins(),
        merged.reference_frequency,
        merged.track_extent().unwrap_or(0.0)
    )
}

/// The full merged dataset as JSON. Missing values are written as `null`.
pub fn write_json(path: &Path, merged: &MergedDataset) -> anyhow::Result<()> {
    let writer = create(path)?;
    serde_json::to_writer_pretty(writer, merged)
        .with_context(|| format!("writing merged dataset {}", path.display()))
}

/// One row per retained ping: time, distance and every per-ping field.
pub fn write_ping_csv(path: &Path, merged: &MergedDataset) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(create(path)?);

    let mut header = vec!["time".to_string(), "distance".to_string()];
    header.extend(merged.ping_fields.keys().cloned());
    writer.write_record(&header)?;

    for (idx, &seconds) in merged.ping_time.iter().enumerate() {
        let mut row = vec![iso_time(seconds)?, merged.distance[idx].to_string()];
        row.extend(merged.ping_fields.values().map(|values| values[idx].to_string()));
        writer.write_record(&row)?;
    }
    writer
        .flush()
        .with_context(|| format!("writing ping table {}", path.display()))
}
