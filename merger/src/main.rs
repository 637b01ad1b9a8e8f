use anyhow::Context;
use clap::Parser;
use glidercore::erddap::ErddapClient;
use output::report;
use std::path::PathBuf;
use workflow::config::{Overrides, WorkflowConfig};
use workflow::runner::{AcousticInput, Runner};

mod generator;
mod output;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Co-register glider telemetry with AZFP echosounder pings")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// ERDDAP server root, e.g. http://slocum-data.marine.rutgers.edu/erddap
    #[arg(long)]
    server: Option<String>,
    #[arg(long)]
    dataset_id: Option<String>,
    /// Raw/trajectory dataset carrying water depth
    #[arg(long)]
    raw_dataset_id: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    min_pitch: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    max_pitch: Option<f64>,
    /// Acoustic dataset (JSON) to merge onto
    #[arg(long, conflicts_with = "synthetic", required_unless_present = "synthetic")]
    acoustic: Option<PathBuf>,
    /// Generate a synthetic AZFP dataset spanning the glider deployment
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Write the merged dataset as JSON
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write the per-ping table as CSV
    #[arg(long)]
    ping_csv: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            server: self.server.clone(),
            dataset_id: self.dataset_id.clone(),
            raw_dataset_id: self.raw_dataset_id.clone(),
            min_pitch: self.min_pitch,
            max_pitch: self.max_pitch,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    }
    .with_overrides(&args.overrides());

    let client = ErddapClient::new(workflow_config.service.clone())
        .context("building ERDDAP client")?;
    let acoustic = match &args.acoustic {
        Some(path) => AcousticInput::File(path.clone()),
        None => AcousticInput::Synthetic,
    };

    let result = Runner::new(workflow_config).execute(&client, &acoustic)?;
    println!("{}", report::summary(&result));

    if let Some(path) = &args.output {
        report::write_json(path, &result.merged)?;
    }
    if let Some(path) = &args.ping_csv {
        report::write_ping_csv(path, &result.merged)?;
    }

    Ok(())
}
