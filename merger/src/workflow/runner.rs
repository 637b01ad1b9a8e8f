use anyhow::Context;
use glidercore::{
    AcousticDataset, GliderLoader, GliderSeries, MergedDataset, Merger, TabularSource,
};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::generator::acoustic::build_acoustic;
use crate::workflow::config::WorkflowConfig;

/// Where the acoustic side of the merge comes from.
#[derive(Debug, Clone)]
pub enum AcousticInput {
    File(PathBuf),
    /// Generated to span the loaded glider deployment.
    Synthetic,
}

pub struct WorkflowResult {
    pub glider_samples: usize,
    pub pings_in: usize,
    pub merged: MergedDataset,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute<S: TabularSource>(
        &self,
        source: S,
        acoustic: &AcousticInput,
    ) -> anyhow::Result<WorkflowResult> {
        let glider = self.load_glider(source)?;
        let acoustic = self.resolve_acoustic(&glider, acoustic)?;

        let merged = Merger::new(self.config.merge.clone())
            .merge(&glider, &acoustic)
            .context("merging glider and acoustic data")?;
        info!(
            "workflow kept {} of {} pings against {} glider samples",
            merged.num_pings(),
            acoustic.num_pings(),
            glider.len()
        );

        Ok(WorkflowResult {
            glider_samples: glider.len(),
            pings_in: acoustic.num_pings(),
            merged,
        })
    }

    fn load_glider<S: TabularSource>(&self, source: S) -> anyhow::Result<GliderSeries> {
        let dataset_id = &self.config.loader.dataset_id;
        GliderLoader::new(source, self.config.loader.clone())
            .load()
            .with_context(|| format!("loading glider dataset {}", dataset_id))
    }

    fn resolve_acoustic(
        &self,
        glider: &GliderSeries,
        input: &AcousticInput,
    ) -> anyhow::Result<AcousticDataset> {
        match input {
            AcousticInput::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("opening acoustic dataset {}", path.display()))?;
                AcousticDataset::from_json_reader(BufReader::new(file))
                    .with_context(|| format!("reading acoustic dataset {}", path.display()))
            }
            AcousticInput::Synthetic => {
                let (start, end) = glider
                    .time_span()
                    .context("glider dataset is empty; nothing to synthesize against")?;
                build_acoustic(&self.config.synthetic, start, end)
            }
        }
    }
}
