//! Minimal ERDDAP tabledap access: URL construction, a blocking HTTP client
//! and the CSV response layout.

pub mod client;
pub mod table;

pub use client::{ErddapClient, ServiceConfig, TableQuery};
pub use table::Table;
