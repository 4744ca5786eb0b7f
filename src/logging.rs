use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset.
///
/// A bare level (`info`, `debug`, ...) applies to this crate only and keeps
/// dependencies (hyper, tower) at `warn`. Anything containing a directive
/// (`=` or `,`) is taken as-is.
fn default_directives(log_level: &str) -> String {
    if log_level.contains('=') || log_level.contains(',') {
        log_level.to_string()
    } else {
        format!("warn,{}={}", env!("CARGO_CRATE_NAME"), log_level)
    }
}

/// Install the global subscriber. Keep the guard alive for the process
/// lifetime or buffered file output is lost.
///
/// The text format keeps targets so ledger and gateway events stay apart.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
        let stdout_layer = fmt::layer().compact().with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    tracing::debug!(
        log_dir = %config.log_dir,
        log_file = %config.log_file,
        rotation = %config.rotation,
        "Logging initialised"
    );

    guard
}
