use super::{add_join_miss, add_route, field};
use crate::constants::{SNIFFERS_NODE_TIMES_FILE, SNIFFERS_ROUTES_FILE, SNIFFERS_SEQUENCES_FILE};
use crate::csv_records::CsvRecords;
use crate::error::Result;
use crate::time::{end_after_duration, parse_duration_ms, parse_local_with_zone};
use crate::types::{JoinMiss, RawRecord, RouteAnalyzer, RouteRecord, Source};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Joins `sequences.csv` against `routes.csv` (by `route_id`) and
/// `node_times.csv` (by `node_time_id`). Sequence rows missing either side
/// are dropped.
#[derive(Default)]
pub struct SniffersAnalyzer {
    routes: Vec<RouteRecord>,
    join_misses: Vec<JoinMiss>,
}

impl SniffersAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn route_with_times(sniffer_route: &RawRecord, node_times: &RawRecord) -> Result<RouteRecord> {
        let start_time =
            parse_local_with_zone(field(sniffer_route, "time")?, field(sniffer_route, "time_zone")?)?;
        let duration_ms = parse_duration_ms(field(node_times, "duration_in_milliseconds")?)?;

        Ok(RouteRecord {
            start_node: field(node_times, "start_node")?.to_string(),
            end_node: field(node_times, "end_node")?.to_string(),
            start_time,
            end_time: end_after_duration(start_time, duration_ms)?,
        })
    }
}

/// Index a file's rows by one of its fields; later rows replace earlier ones
fn index_by(path: &Path, key: &str) -> Result<HashMap<String, RawRecord>> {
    let mut indexed = HashMap::new();
    for record in CsvRecords::open(path)? {
        let record = record?;
        indexed.insert(record.get(key).cloned().unwrap_or_default(), record);
    }
    debug!("indexed {} rows of {} by {}", indexed.len(), path.display(), key);
    Ok(indexed)
}

impl RouteAnalyzer for SniffersAnalyzer {
    fn source(&self) -> Source {
        Source::Sniffers
    }

    #[instrument(skip(self), fields(source = "sniffers"))]
    fn load(&mut self, data_dir: &Path) -> Result<()> {
        let routes_by_id = index_by(&data_dir.join(SNIFFERS_ROUTES_FILE), "route_id")?;
        let node_times_by_id = index_by(&data_dir.join(SNIFFERS_NODE_TIMES_FILE), "node_time_id")?;

        let mut routes = Vec::new();
        let mut join_misses = Vec::new();

        for sequence in CsvRecords::open(&data_dir.join(SNIFFERS_SEQUENCES_FILE))? {
            let sequence = sequence?;
            let route_id = sequence.get("route_id").map(String::as_str).unwrap_or_default();
            let node_time_id = sequence.get("node_time_id").map(String::as_str).unwrap_or_default();

            match (routes_by_id.get(route_id), node_times_by_id.get(node_time_id)) {
                (Some(route), Some(node_times)) => {
                    let route = Self::route_with_times(route, node_times)?;
                    add_route(Source::Sniffers, &mut routes, route);
                }
                _ => add_join_miss(
                    Source::Sniffers,
                    &mut join_misses,
                    format!("Missing data for route {route_id} node_time {node_time_id}"),
                ),
            }
        }

        self.routes = routes;
        self.join_misses = join_misses;
        Ok(())
    }

    fn get_routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    fn join_misses(&self) -> &[JoinMiss] {
        &self.join_misses
    }
}
