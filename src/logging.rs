use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "route_sync.log";

/// Initializes the logging system with both console and file output.
pub fn init_logging() {
    // Reported once the subscriber is up
    let log_dir = prepare_log_dir(Path::new(LOG_DIR));

    // JSON file layer with daily rotation, only when the directory is usable
    let (file_layer, guard) = match &log_dir {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().json().with_writer(non_blocking_writer)), Some(guard))
        }
        Err(_) => (None, None),
    };

    // Console output goes to stderr so `analyze` can print JSON on stdout
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("route_sync=info,warn"));

    // Set the global default subscriber
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    if let Err(e) = log_dir {
        warn!("Could not create log directory {}: {}; file logging disabled", LOG_DIR, e);
    }

    // Keep the writer alive for the whole process so logs are flushed
    std::mem::forget(guard);
}

/// Create the log directory, or confirm an existing one
fn prepare_log_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}
