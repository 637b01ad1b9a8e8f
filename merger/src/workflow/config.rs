use anyhow::Context;
use glidercore::erddap::ServiceConfig;
use glidercore::{LoaderConfig, MergeConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::generator::acoustic::SyntheticConfig;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowConfig {
    pub service: ServiceConfig,
    pub loader: LoaderConfig,
    pub merge: MergeConfig,
    pub synthetic: SyntheticConfig,
}

/// Command-line values that take precedence over the YAML file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub dataset_id: Option<String>,
    pub raw_dataset_id: Option<String>,
    pub min_pitch: Option<f64>,
    pub max_pitch: Option<f64>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(server) = &overrides.server {
            self.service.server = server.clone();
        }
        if let Some(dataset_id) = &overrides.dataset_id {
            self.loader.dataset_id = dataset_id.clone();
        }
        if let Some(raw_dataset_id) = &overrides.raw_dataset_id {
            self.loader.raw_dataset_id = Some(raw_dataset_id.clone());
        }
        if let Some(min_pitch) = overrides.min_pitch {
            self.merge.min_pitch = min_pitch;
        }
        if let Some(max_pitch) = overrides.max_pitch {
            self.merge.max_pitch = max_pitch;
        }
        self
    }
}
