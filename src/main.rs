use anyhow::Context;
use clap::{Parser, Subcommand};
use route_sync::analyzers::create_analyzer_by_name;
use route_sync::app::ports::{PassphrasePort, RouteDeliveryPort};
use route_sync::config::Config;
use route_sync::constants::{get_supported_sources, METRICS_SNAPSHOT_FILE};
use route_sync::infra::{LoggingDelivery, ReqwestCollector};
use route_sync::{logging, metrics, Pipeline, RouteAnalyzer, Source, SourceReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "route_sync")]
#[command(about = "Reconciles travel routes from several sources and posts them to a collector")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to route_sync.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, reconcile and post routes
    Run {
        /// Sources to process (comma-separated). Available: sentinels, sniffers, loopholes
        #[arg(long)]
        sources: Option<String>,
        /// Reuse the files already in the data directory
        #[arg(long, alias = "skipdl")]
        skip_download: bool,
        /// Directory holding one sub-directory per source
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Log routes instead of posting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Reconcile one source's local files and print the routes as JSON
    Analyze {
        #[arg(long)]
        source: String,
        /// Directory holding the source's files (defaults to <data root>/<source>)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List the supported sources
    Sources,
}

fn print_report(report: &SourceReport) {
    println!("\n📊 Results for {}:", report.source);
    println!("   Routes found: {}", report.routes_found);
    println!("   Delivered: {}", report.delivered);
    println!("   Failed deliveries: {}", report.failed_deliveries);
    println!("   Join misses: {}", report.join_misses);
    if let Some(error) = &report.error {
        println!("   ❌ Aborted: {}", error);
    }
}

async fn run(
    mut config: Config,
    sources: Option<String>,
    skip_download: bool,
    data_dir: Option<PathBuf>,
    dry_run: bool,
) -> anyhow::Result<bool> {
    let sources = match sources {
        Some(list) => Source::parse_list(&list)?,
        None => config.sources()?,
    };
    if let Some(dir) = data_dir {
        config.data.root = dir;
    }
    config.data.skip_download |= skip_download;

    let collector = Arc::new(ReqwestCollector::new(
        &config.collector.url,
        config.collector.timeout_seconds,
    )?);
    let delivery: Arc<dyn RouteDeliveryPort> = if dry_run {
        Arc::new(LoggingDelivery)
    } else {
        collector.clone()
    };

    let mut pipeline = Pipeline::new(collector.clone(), delivery, config.data.root.clone())
        .skip_download(config.data.skip_download);
    // A dry run over local files never talks to the collector
    if !(dry_run && config.data.skip_download) {
        let passphrase: Arc<dyn PassphrasePort> = collector;
        pipeline = pipeline.with_passphrase(passphrase);
    }

    info!("Running sources {:?} from {}", sources, config.data.root.display());
    let reports = pipeline
        .run(&sources)
        .await
        .context("failed to obtain collector passphrase")?;

    for report in &reports {
        print_report(report);
    }
    Ok(reports.iter().all(SourceReport::is_success))
}

fn analyze(config: &Config, source: &str, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut analyzer = create_analyzer_by_name(source)?;
    let source = analyzer.source();
    let data_dir = data_dir.unwrap_or_else(|| config.data.root.join(source.as_str()));

    analyzer
        .load(&data_dir)
        .with_context(|| format!("failed to analyze {} in {}", source, data_dir.display()))?;

    if !analyzer.join_misses().is_empty() {
        warn!("{} join misses while reading {}", analyzer.join_misses().len(), source);
    }
    println!("{}", serde_json::to_string_pretty(analyzer.get_routes())?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    let metrics_handle = metrics::init_metrics();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            sources,
            skip_download,
            data_dir,
            dry_run,
        } => {
            println!("🔄 Running route sync...");
            let all_ok = run(config, sources, skip_download, data_dir, dry_run).await?;
            if let Some(handle) = &metrics_handle {
                if let Err(e) = metrics::write_snapshot(handle, Path::new(METRICS_SNAPSHOT_FILE)) {
                    warn!("Could not write metrics snapshot: {}", e);
                }
            }
            if !all_ok {
                warn!("Some sources did not complete cleanly");
                std::process::exit(1);
            }
        }
        Commands::Analyze { source, data_dir } => {
            analyze(&config, &source, data_dir)?;
        }
        Commands::Sources => {
            for source in get_supported_sources() {
                println!("{source}");
            }
        }
    }

    Ok(())
}
