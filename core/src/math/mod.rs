pub mod geodesy;
pub mod interp;
pub mod stats;

pub use geodesy::distances_from;
pub use stats::StatsHelper;
