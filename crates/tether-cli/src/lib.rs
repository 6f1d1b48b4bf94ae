//! Process entry plumbing for `tetherd`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file name, created in the log directory next to the config file.
pub const LOG_FILE: &str = "tether.log";

/// Initialize the process-wide tracing subscriber: human-readable lines on
/// stdout plus the same stream appended to a log file.
///
/// The returned guard must be held for the lifetime of the process so the
/// file writer flushes on shutdown.
pub fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer().with_writer(std::io::stdout);
    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

/// Startup banner, printed before logging is initialized.
pub fn print_banner() {
    println!("=======================================");
    println!("   tetherd - reverse SSH tunnel keeper");
    println!("=======================================");
}
