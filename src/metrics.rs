//! Prometheus recorder for the per-source route counters.
//!
//! No HTTP listener is started. A run renders the counters once it is done
//! and writes them to a text file next to the logs.

use crate::error::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const ROUTES_PRODUCED: &str = "route_sync_routes_produced_total";
pub const JOIN_MISSES: &str = "route_sync_join_misses_total";
pub const ROUTES_DELIVERED: &str = "route_sync_routes_delivered_total";
pub const DELIVERY_FAILURES: &str = "route_sync_delivery_failures_total";
pub const SOURCE_FAILURES: &str = "route_sync_source_failures_total";

pub fn describe_metrics() {
    ::metrics::describe_counter!(ROUTES_PRODUCED, "Routes reconciled from source data");
    ::metrics::describe_counter!(JOIN_MISSES, "References dropped because their companion record was missing");
    ::metrics::describe_counter!(ROUTES_DELIVERED, "Routes accepted by the collector");
    ::metrics::describe_counter!(DELIVERY_FAILURES, "Routes the collector rejected or never received");
    ::metrics::describe_counter!(SOURCE_FAILURES, "Sources aborted before delivery");
}

/// Install the global recorder. A failure is logged and leaves the
/// counters as no-ops.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_metrics();
            info!("Prometheus recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    }
}

/// Write the rendered counters in the Prometheus text format
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, handle.render())?;
    info!("Wrote metrics snapshot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{add_join_miss, add_route};
    use crate::types::{RouteRecord, Source};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn route() -> RouteRecord {
        let t = Utc.with_ymd_and_hms(2030, 12, 31, 12, 0, 1).unwrap();
        RouteRecord {
            start_node: "alpha".into(),
            end_node: "beta".into(),
            start_time: t,
            end_time: t,
        }
    }

    #[test]
    fn test_analyzer_counters_reach_the_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            let mut routes = Vec::new();
            add_route(Source::Sentinels, &mut routes, route());
            add_route(Source::Sentinels, &mut routes, route());
            let mut misses = Vec::new();
            add_join_miss(Source::Loopholes, &mut misses, "Missing node pair 9".into());
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"route_sync_routes_produced_total{source="sentinels"} 2"#));
        assert!(rendered.contains(r#"route_sync_join_misses_total{source="loopholes"} 1"#));
    }

    #[test]
    fn test_snapshot_is_written_to_nested_path() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || {
            ::metrics::counter!(ROUTES_DELIVERED, "source" => "sniffers").increment(3);
        });

        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("route_sync.prom");
        write_snapshot(&handle, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"route_sync_routes_delivered_total{source="sniffers"} 3"#));
    }
}
