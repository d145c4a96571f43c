// Source-specific reconciliation of raw files into canonical routes

pub mod factory;
pub mod loopholes;
pub mod sentinels;
pub mod sniffers;

pub use factory::{create_analyzer, create_analyzer_by_name};
pub use loopholes::LoopholesAnalyzer;
pub use sentinels::SentinelsAnalyzer;
pub use sniffers::SniffersAnalyzer;

use crate::error::{Result, RouteError};
use crate::metrics::{JOIN_MISSES, ROUTES_PRODUCED};
use crate::types::{JoinMiss, RawRecord, RouteRecord, Source};
use ::metrics::counter;
use tracing::{error, info};

/// Look up a required field of a raw record
pub(crate) fn field<'a>(record: &'a RawRecord, name: &str) -> Result<&'a str> {
    record
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| RouteError::MissingField(format!("{name} not found in {record:?}")))
}

/// Append a produced route, logging it
pub(crate) fn add_route(source: Source, routes: &mut Vec<RouteRecord>, route: RouteRecord) {
    info!("adding {} route {}", source, route);
    counter!(ROUTES_PRODUCED, "source" => source.as_str()).increment(1);
    routes.push(route);
}

/// Record a dropped join, logging it
pub(crate) fn add_join_miss(source: Source, misses: &mut Vec<JoinMiss>, description: String) {
    error!("{}", description);
    counter!(JOIN_MISSES, "source" => source.as_str()).increment(1);
    misses.push(JoinMiss {
        source,
        description,
    });
}
