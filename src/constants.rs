/// Source names as they appear in configuration, on the CLI and in the
/// collector's `source` parameter.
pub const SENTINELS_SOURCE: &str = "sentinels";
pub const SNIFFERS_SOURCE: &str = "sniffers";
pub const LOOPHOLES_SOURCE: &str = "loopholes";

// Collector endpoints
pub const DEFAULT_COLLECTOR_URL: &str = "https://challenge.distribusion.com/the_one";
pub const ROUTES_PATH: &str = "routes";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

// Local layout
pub const DEFAULT_DATA_ROOT: &str = "data";
pub const DEFAULT_CONFIG_FILE: &str = "route_sync.toml";

// Environment overrides
pub const ENV_COLLECTOR_URL: &str = "ROUTE_SYNC_COLLECTOR_URL";
pub const ENV_DATA_ROOT: &str = "ROUTE_SYNC_DATA_ROOT";

// Per-source file names
pub const SENTINELS_ROUTES_FILE: &str = "routes.csv";
pub const SNIFFERS_ROUTES_FILE: &str = "routes.csv";
pub const SNIFFERS_NODE_TIMES_FILE: &str = "node_times.csv";
pub const SNIFFERS_SEQUENCES_FILE: &str = "sequences.csv";
pub const LOOPHOLES_NODE_PAIRS_FILE: &str = "node_pairs.json";
pub const LOOPHOLES_ROUTES_FILE: &str = "routes.json";

/// Wire format for times posted to the collector (always UTC).
pub const DELIVERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Get all supported source names, in processing order
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![SENTINELS_SOURCE, SNIFFERS_SOURCE, LOOPHOLES_SOURCE]
}

/// Where `run` leaves the rendered counters
pub const METRICS_SNAPSHOT_FILE: &str = "logs/route_sync.prom";
