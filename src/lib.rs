//! Reconciles travel routes from the sentinels, sniffers and loopholes
//! sources into one canonical record and publishes them to a collector.

pub mod analyzers;
pub mod config;
pub mod constants;
pub mod csv_records;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod time;
pub mod types;

// Ports and their adapters
pub mod app;
pub mod infra;

pub use error::{Result, RouteError};
pub use pipeline::{Pipeline, SourceReport};
pub use types::{JoinMiss, RouteAnalyzer, RouteDelivery, RouteRecord, Source};
