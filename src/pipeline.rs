use crate::analyzers::create_analyzer;
use crate::app::ports::{PassphrasePort, RouteDeliveryPort, SourceDataPort};
use crate::error::{Result, RouteError};
use crate::metrics::{DELIVERY_FAILURES, ROUTES_DELIVERED, SOURCE_FAILURES};
use crate::types::{RouteAnalyzer, RouteDelivery, RouteRecord, Source};
use ::metrics::counter;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, instrument, Instrument};

/// Outcome of processing one source
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub routes_found: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    pub join_misses: usize,
    /// Set when the source was aborted
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: Source) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed_deliveries == 0
    }
}

/// Runs each configured source through download, reconciliation and
/// delivery, one source after another.
pub struct Pipeline {
    passphrase: Option<Arc<dyn PassphrasePort>>,
    source_data: Arc<dyn SourceDataPort>,
    delivery: Arc<dyn RouteDeliveryPort>,
    data_root: PathBuf,
    skip_download: bool,
}

impl Pipeline {
    pub fn new(
        source_data: Arc<dyn SourceDataPort>,
        delivery: Arc<dyn RouteDeliveryPort>,
        data_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            passphrase: None,
            source_data,
            delivery,
            data_root: data_root.into(),
            skip_download: false,
        }
    }

    /// Without a passphrase port, deliveries carry an empty passphrase
    pub fn with_passphrase(mut self, passphrase: Arc<dyn PassphrasePort>) -> Self {
        self.passphrase = Some(passphrase);
        self
    }

    /// Use the files already under the data root instead of downloading
    pub fn skip_download(mut self, skip: bool) -> Self {
        self.skip_download = skip;
        self
    }

    /// Local directory holding a source's raw files
    pub fn source_data_dir(&self, source: Source) -> PathBuf {
        self.data_root.join(source.as_str())
    }

    /// Process every source in order. Only a failure to obtain the
    /// passphrase aborts the whole run; per-source failures end up in the
    /// matching report.
    #[instrument(skip(self))]
    pub async fn run(&self, sources: &[Source]) -> Result<Vec<SourceReport>> {
        let passphrase = match &self.passphrase {
            Some(port) => port.fetch_passphrase().await?,
            None => String::new(),
        };

        let mut reports = Vec::with_capacity(sources.len());
        for &source in sources {
            let span = info_span!("source", source = %source);
            let report = self.run_source(source, &passphrase).instrument(span).await;
            reports.push(report);
        }
        Ok(reports)
    }

    async fn run_source(&self, source: Source, passphrase: &str) -> SourceReport {
        info!("**** processing source {}", source);
        let mut report = SourceReport::new(source);

        match self.load_source(source, passphrase).await {
            Ok(analyzer) => {
                report.routes_found = analyzer.get_routes().len();
                report.join_misses = analyzer.join_misses().len();
                self.post_routes(source, passphrase, analyzer.get_routes(), &mut report)
                    .await;
            }
            Err(e) => {
                error!("Source {} aborted: {}", source, e);
                counter!(SOURCE_FAILURES, "source" => source.as_str()).increment(1);
                report.error = Some(e.to_string());
            }
        }

        info!(
            "Finished {}: {} routes, {} delivered, {} failed, {} join misses",
            source, report.routes_found, report.delivered, report.failed_deliveries, report.join_misses
        );
        report
    }

    /// Obtain the source's raw files and run its analyzer over them
    pub async fn load_source(&self, source: Source, passphrase: &str) -> Result<Box<dyn RouteAnalyzer>> {
        let data_dir = if self.skip_download {
            self.source_data_dir(source)
        } else {
            self.source_data
                .download(source, passphrase, &self.data_root)
                .await?
        };
        if !data_dir.is_dir() {
            return Err(RouteError::MissingFile { path: data_dir });
        }

        let mut analyzer = create_analyzer(source);
        analyzer.load(&data_dir)?;
        info!(
            "{} produced {} routes from {}",
            source,
            analyzer.get_routes().len(),
            data_dir.display()
        );
        Ok(analyzer)
    }

    async fn post_routes(
        &self,
        source: Source,
        passphrase: &str,
        routes: &[RouteRecord],
        report: &mut SourceReport,
    ) {
        info!("*** importing source {}", source);
        for route in routes {
            let delivery = RouteDelivery::new(source, passphrase, route);
            match self.delivery.deliver(&delivery).await {
                Ok(status) => {
                    debug!("Delivered {} with status {}", route, status);
                    counter!(ROUTES_DELIVERED, "source" => source.as_str()).increment(1);
                    report.delivered += 1;
                }
                Err(e) => {
                    error!("Failed to deliver {}: {}", route, e);
                    counter!(DELIVERY_FAILURES, "source" => source.as_str()).increment(1);
                    report.failed_deliveries += 1;
                }
            }
        }
    }
}
