use super::{add_join_miss, add_route};
use crate::constants::{LOOPHOLES_NODE_PAIRS_FILE, LOOPHOLES_ROUTES_FILE};
use crate::error::{Result, RouteError};
use crate::time::parse_iso8601;
use crate::types::{JoinMiss, RouteAnalyzer, RouteRecord, Source};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct NodePairsDocument {
    node_pairs: Vec<NodePair>,
}

#[derive(Debug, Deserialize)]
struct NodePair {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    start_node: Value,
    #[serde(default)]
    end_node: Value,
}

#[derive(Debug, Deserialize)]
struct RoutesDocument {
    routes: Vec<LoopholeRoute>,
}

#[derive(Debug, Deserialize)]
struct LoopholeRoute {
    #[serde(default)]
    node_pair_id: Value,
    #[serde(default)]
    start_time: Value,
    #[serde(default)]
    end_time: Value,
}

// Element fields are only checked once a route has found its node pair

/// Node identifiers arrive as strings or bare numbers
fn node_id(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Err(RouteError::MissingField(format!("node pair {name}"))),
        other => Err(RouteError::parse(
            format!("loopholes {name}"),
            format!("expected a node identifier, found {other}"),
        )),
    }
}

fn timestamp<'a>(name: &str, value: &'a Value) -> Result<&'a str> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Err(RouteError::MissingField(format!("route {name}"))),
        other => Err(RouteError::parse(
            format!("loopholes {name}"),
            format!("expected a timestamp, found {other}"),
        )),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(RouteError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Resolves each route's `node_pair_id` by scanning the node pairs in order
#[derive(Default)]
pub struct LoopholesAnalyzer {
    routes: Vec<RouteRecord>,
    join_misses: Vec<JoinMiss>,
}

impl LoopholesAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn route_for(loophole_route: &LoopholeRoute, node_pair: &NodePair) -> Result<RouteRecord> {
        Ok(RouteRecord {
            start_node: node_id("start_node", &node_pair.start_node)?,
            end_node: node_id("end_node", &node_pair.end_node)?,
            start_time: parse_iso8601(timestamp("start_time", &loophole_route.start_time)?)?,
            end_time: parse_iso8601(timestamp("end_time", &loophole_route.end_time)?)?,
        })
    }
}

impl RouteAnalyzer for LoopholesAnalyzer {
    fn source(&self) -> Source {
        Source::Loopholes
    }

    #[instrument(skip(self), fields(source = "loopholes"))]
    fn load(&mut self, data_dir: &Path) -> Result<()> {
        let node_pairs = read_json::<NodePairsDocument>(&data_dir.join(LOOPHOLES_NODE_PAIRS_FILE))?.node_pairs;
        let loophole_routes = read_json::<RoutesDocument>(&data_dir.join(LOOPHOLES_ROUTES_FILE))?.routes;
        debug!("{:?}", node_pairs);
        debug!("{:?}", loophole_routes);

        let mut routes = Vec::new();
        let mut join_misses = Vec::new();

        for loophole_route in &loophole_routes {
            debug!("{:?}", loophole_route);
            match node_pairs.iter().find(|pair| pair.id == loophole_route.node_pair_id) {
                Some(node_pair) => {
                    let route = Self::route_for(loophole_route, node_pair)?;
                    add_route(Source::Loopholes, &mut routes, route);
                }
                None => add_join_miss(
                    Source::Loopholes,
                    &mut join_misses,
                    format!("Missing node pair {}", loophole_route.node_pair_id),
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
