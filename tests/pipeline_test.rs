use anyhow::Result;
use async_trait::async_trait;
use route_sync::app::ports::{PassphrasePort, RouteDeliveryPort, SourceDataPort};
use route_sync::{Pipeline, RouteAnalyzer, RouteDelivery, RouteError, Source};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::Mutex;

const SENTINELS_ROUTES: &str = "route_id, node, index, time\n\
                                1, alpha, 0, 2030-12-31T13:00:01+09:00\n\
                                1, beta, 1, 2030-12-31T13:00:02+09:00\n\
                                1, gamma, 2, 2030-12-31T13:00:03+09:00\n";

const SNIFFERS_ROUTES: &str = "route_id, time, time_zone\n1, 2030-12-31T13:00:06, UTC+01:00\n";
const SNIFFERS_NODE_TIMES: &str =
    "node_time_id, start_node, end_node, duration_in_milliseconds\n1, lambda, tau, 1000\n";
const SNIFFERS_SEQUENCES: &str = "route_id, node_time_id\n1, 1\n1, 2\n";

const LOOPHOLES_NODE_PAIRS: &str =
    r#"{"node_pairs": [{"id": "1", "start_node": "gamma", "end_node": "delta"}]}"#;
const LOOPHOLES_ROUTES: &str = r#"{"routes": [
    {"route_id": "1", "node_pair_id": "1", "start_time": "2030-12-31T13:00:04Z", "end_time": "2030-12-31T13:00:05Z"},
    {"route_id": "2", "node_pair_id": "9", "start_time": "2030-12-31T13:00:04Z", "end_time": "2030-12-31T13:00:05Z"}
]}"#;

fn write_source(data_root: &Path, source: Source) {
    let dir = data_root.join(source.as_str());
    fs::create_dir_all(&dir).unwrap();
    let files: &[(&str, &str)] = match source {
        Source::Sentinels => &[("routes.csv", SENTINELS_ROUTES)],
        Source::Sniffers => &[
            ("routes.csv", SNIFFERS_ROUTES),
            ("node_times.csv", SNIFFERS_NODE_TIMES),
            ("sequences.csv", SNIFFERS_SEQUENCES),
        ],
        Source::Loopholes => &[
            ("node_pairs.json", LOOPHOLES_NODE_PAIRS),
            ("routes.json", LOOPHOLES_ROUTES),
        ],
    };
    for (name, contents) in files {
        fs::write(dir.join(name), contents).unwrap();
    }
}

struct RecordingDelivery {
    deliveries: Arc<Mutex<Vec<RouteDelivery>>>,
    reject_node: Option<String>,
}

impl RecordingDelivery {
    fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
            reject_node: None,
        }
    }

    fn rejecting(node: &str) -> Self {
        Self {
            reject_node: Some(node.to_string()),
            ..Self::new()
        }
    }
}

#[async_trait]
impl RouteDeliveryPort for RecordingDelivery {
    async fn deliver(&self, delivery: &RouteDelivery) -> route_sync::Result<u16> {
        if self.reject_node.as_deref() == Some(delivery.start_node.as_str()) {
            return Err(RouteError::Api {
                message: "collector responded 422".into(),
            });
        }
        self.deliveries.lock().await.push(delivery.clone());
        Ok(201)
    }
}

/// Writes fixture files as if an archive had been downloaded and unpacked
struct FixtureDownloads {
    requests: Arc<Mutex<Vec<(Source, String)>>>,
    unavailable: Vec<Source>,
}

#[async_trait]
impl SourceDataPort for FixtureDownloads {
    async fn download(&self, source: Source, passphrase: &str, data_root: &Path) -> route_sync::Result<PathBuf> {
        self.requests.lock().await.push((source, passphrase.to_string()));
        if self.unavailable.contains(&source) {
            return Err(RouteError::Api {
                message: "unsupported source type 'text/html'".into(),
            });
        }
        write_source(data_root, source);
        Ok(data_root.join(source.as_str()))
    }
}

struct NoDownloads;

#[async_trait]
impl SourceDataPort for NoDownloads {
    async fn download(&self, source: Source, _passphrase: &str, _data_root: &Path) -> route_sync::Result<PathBuf> {
        panic!("unexpected download of {source}");
    }
}

struct FixedPassphrase(Option<&'static str>);

#[async_trait]
impl PassphrasePort for FixedPassphrase {
    async fn fetch_passphrase(&self) -> route_sync::Result<String> {
        self.0
            .map(String::from)
            .ok_or_else(|| RouteError::MissingField("pills.red.passphrase not found".into()))
    }
}

#[tokio::test]
async fn test_local_files_are_reconciled_and_delivered_in_order() -> Result<()> {
    let data_root = tempdir()?;
    for source in Source::all() {
        write_source(data_root.path(), source);
    }

    let delivery = RecordingDelivery::new();
    let delivered = delivery.deliveries.clone();
    let pipeline = Pipeline::new(Arc::new(NoDownloads), Arc::new(delivery), data_root.path())
        .skip_download(true);

    let reports = pipeline.run(&Source::all()).await?;
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.is_success()));

    let sentinels = &reports[0];
    assert_eq!((sentinels.source.as_str(), sentinels.routes_found, sentinels.delivered), ("sentinels", 2, 2));
    let sniffers = &reports[1];
    assert_eq!((sniffers.routes_found, sniffers.join_misses), (1, 1));
    let loopholes = &reports[2];
    assert_eq!((loopholes.routes_found, loopholes.join_misses), (1, 1));

    let delivered = delivered.lock().await;
    let summary: Vec<(&str, &str, &str, &str)> = delivered
        .iter()
        .map(|d| (d.source.as_str(), d.start_node.as_str(), d.end_node.as_str(), d.start_time.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("sentinels", "alpha", "beta", "2030-12-31T04:00:01"),
            ("sentinels", "beta", "gamma", "2030-12-31T04:00:02"),
            ("sniffers", "lambda", "tau", "2030-12-31T12:00:06"),
            ("loopholes", "gamma", "delta", "2030-12-31T13:00:04"),
        ]
    );
    assert_eq!(delivered[2].end_time, "2030-12-31T12:00:07");
    assert!(delivered.iter().all(|d| d.passphrase.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_downloads_use_the_passphrase() -> Result<()> {
    let data_root = tempdir()?;
    let downloads = FixtureDownloads {
        requests: Arc::new(Mutex::new(Vec::new())),
        unavailable: Vec::new(),
    };
    let requests = downloads.requests.clone();
    let delivery = RecordingDelivery::new();
    let delivered = delivery.deliveries.clone();

    let pipeline = Pipeline::new(Arc::new(downloads), Arc::new(delivery), data_root.path())
        .with_passphrase(Arc::new(FixedPassphrase(Some("Kans4s-i$-g01ng-by3-bye"))));
    let reports = pipeline.run(&[Source::Loopholes, Source::Sentinels]).await?;

    assert_eq!(reports[0].source, "loopholes");
    assert_eq!(reports[1].source, "sentinels");
    assert_eq!(
        *requests.lock().await,
        vec![
            (Source::Loopholes, "Kans4s-i$-g01ng-by3-bye".to_string()),
            (Source::Sentinels, "Kans4s-i$-g01ng-by3-bye".to_string()),
        ]
    );
    let delivered = delivered.lock().await;
    assert_eq!(delivered.len(), 3);
    assert!(delivered.iter().all(|d| d.passphrase == "Kans4s-i$-g01ng-by3-bye"));
    Ok(())
}

#[tokio::test]
async fn test_failed_source_does_not_block_the_rest() -> Result<()> {
    let data_root = tempdir()?;
    let downloads = FixtureDownloads {
        requests: Arc::new(Mutex::new(Vec::new())),
        unavailable: vec![Source::Sentinels],
    };
    let delivery = RecordingDelivery::new();
    let delivered = delivery.deliveries.clone();

    let pipeline = Pipeline::new(Arc::new(downloads), Arc::new(delivery), data_root.path())
        .with_passphrase(Arc::new(FixedPassphrase(Some("pill"))));
    let reports = pipeline.run(&Source::all()).await?;

    assert!(reports[0].error.as_deref().unwrap().contains("unsupported source type"));
    assert_eq!(reports[0].delivered, 0);
    assert!(reports[1].is_success());
    assert!(reports[2].is_success());
    assert_eq!(delivered.lock().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_local_data_aborts_only_that_source() -> Result<()> {
    let data_root = tempdir()?;
    write_source(data_root.path(), Source::Loopholes);
    write_source(data_root.path(), Source::Sniffers);
    fs::remove_file(data_root.path().join("sniffers/node_times.csv"))?;

    let pipeline = Pipeline::new(Arc::new(NoDownloads), Arc::new(RecordingDelivery::new()), data_root.path())
        .skip_download(true);
    let reports = pipeline.run(&Source::all()).await?;

    assert!(reports[0].error.as_deref().unwrap().starts_with("Missing file"));
    assert!(reports[1].error.as_deref().unwrap().contains("node_times.csv"));
    assert_eq!(reports[1].routes_found, 0);
    assert_eq!(reports[2].delivered, 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_deliveries_are_counted_not_retried() -> Result<()> {
    let data_root = tempdir()?;
    write_source(data_root.path(), Source::Sentinels);

    let delivery = RecordingDelivery::rejecting("alpha");
    let delivered = delivery.deliveries.clone();
    let pipeline = Pipeline::new(Arc::new(NoDownloads), Arc::new(delivery), data_root.path())
        .skip_download(true);
    let reports = pipeline.run(&[Source::Sentinels]).await?;

    assert_eq!(reports[0].routes_found, 2);
    assert_eq!(reports[0].delivered, 1);
    assert_eq!(reports[0].failed_deliveries, 1);
    assert!(!reports[0].is_success());
    assert_eq!(delivered.lock().await[0].start_node, "beta");
    Ok(())
}

#[tokio::test]
async fn test_missing_passphrase_aborts_the_run() {
    let data_root = tempdir().unwrap();
    let pipeline = Pipeline::new(Arc::new(NoDownloads), Arc::new(RecordingDelivery::new()), data_root.path())
        .with_passphrase(Arc::new(FixedPassphrase(None)));

    let err = pipeline.run(&Source::all()).await.unwrap_err();
    assert!(matches!(err, RouteError::MissingField(_)));
}

#[tokio::test]
async fn test_load_source_is_idempotent() -> Result<()> {
    let data_root = tempdir()?;
    write_source(data_root.path(), Source::Sniffers);
    let pipeline = Pipeline::new(Arc::new(NoDownloads), Arc::new(RecordingDelivery::new()), data_root.path())
        .skip_download(true);

    let first = pipeline.load_source(Source::Sniffers, "").await?;
    let second = pipeline.load_source(Source::Sniffers, "").await?;
    assert_eq!(first.get_routes(), second.get_routes());
    assert_eq!(first.join_misses(), second.join_misses());
    Ok(())
}
