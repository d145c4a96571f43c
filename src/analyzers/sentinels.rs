use super::{add_route, field};
use crate::constants::SENTINELS_ROUTES_FILE;
use crate::csv_records::CsvRecords;
use crate::error::{Result, RouteError};
use crate::time::parse_free_form;
use crate::types::{RawRecord, RouteAnalyzer, RouteRecord, Source};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Chains consecutive `index` rows of each `route_id` into routes.
///
/// Adjacency is only seen when the predecessor row was read first: a route
/// whose rows appear as index 1 then index 0 produces nothing.
#[derive(Default)]
pub struct SentinelsAnalyzer {
    routes: Vec<RouteRecord>,
}

impl SentinelsAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn route_between(start: &RawRecord, end: &RawRecord) -> Result<RouteRecord> {
        Ok(RouteRecord {
            start_node: field(start, "node")?.to_string(),
            end_node: field(end, "node")?.to_string(),
            start_time: parse_free_form(field(start, "time")?)?,
            end_time: parse_free_form(field(end, "time")?)?,
        })
    }
}

fn parse_index(record: &RawRecord) -> Result<i64> {
    let raw = field(record, "index")?;
    raw.trim()
        .parse::<i64>()
        .map_err(|e| RouteError::parse("sentinels index", format!("'{raw}': {e}")))
}

impl RouteAnalyzer for SentinelsAnalyzer {
    fn source(&self) -> Source {
        Source::Sentinels
    }

    #[instrument(skip(self), fields(source = "sentinels"))]
    fn load(&mut self, data_dir: &Path) -> Result<()> {
        // route_id -> index -> row
        let mut records_by_route: HashMap<String, HashMap<i64, RawRecord>> = HashMap::new();
        let mut routes = Vec::new();

        for record in CsvRecords::open(&data_dir.join(SENTINELS_ROUTES_FILE))? {
            let record = record?;
            let route_id = record.get("route_id").cloned().unwrap_or_default();
            let index = parse_index(&record)?;
            let route_records = records_by_route.entry(route_id).or_default();

            if let Some(previous) = index.checked_sub(1).and_then(|i| route_records.get(&i)) {
                let route = Self::route_between(previous, &record)?;
                add_route(Source::Sentinels, &mut routes, route);
            }
            debug!("stored record at index {}", index);
            route_records.insert(index, record);
        }

        self.routes = routes;
        Ok(())
    }

    fn get_routes(&self) -> &[RouteRecord] {
        &self.routes
    }
}
