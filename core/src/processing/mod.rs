pub mod loader;
pub mod merge;

pub use loader::{GliderLoader, LoaderConfig};
pub use merge::{MergeConfig, Merger};
