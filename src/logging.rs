use std::fs;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Keeps the background log writers alive. Buffered lines are flushed when
/// this is dropped, so hold it until the process is about to exit.
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Initializes logging: console, a daily JSON run log, and a daily error log.
pub fn init_logging(log_dir: &Path) -> LogGuards {
    let (subscriber, guards) = build_subscriber(log_dir);
    subscriber.init();
    guards
}

/// Builds the subscriber without installing it.
pub fn build_subscriber(log_dir: &Path) -> (impl Subscriber + Send + Sync + 'static, LogGuards) {
    // Ensure logs directory exists
    let _ = fs::create_dir_all(log_dir);

    // Create non-blocking file appenders for daily log rotation
    let file_appender = tracing_appender::rolling::daily(log_dir, "gold_rates.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let error_appender = tracing_appender::rolling::daily(log_dir, "gold_rates.error.log");
    let (error_writer, error_guard) = tracing_appender::non_blocking(error_appender);

    // Create a JSON layer for file logging
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Errors also land in their own file
    let error_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(error_writer)
        .with_filter(LevelFilter::ERROR);

    // Create a formatted layer for console logging
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    // Determine filter: respect RUST_LOG if set; otherwise default to info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gold_rates=info,warn"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(error_layer)
        .with(console_layer);

    (subscriber, LogGuards { _guards: vec![guard, error_guard] })
}
