pub mod acoustic;
pub mod glider;
pub mod merged;
mod nullable;

pub use acoustic::{AcousticDataset, FrequencySelector};
pub use glider::GliderSeries;
pub use merged::MergedDataset;
