//! Tracing bootstrap: stderr formatter plus an optional rolling file
//! appender under the platform log directory (spec §10 ambient stack).

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::platform;

/// Install the global tracing subscriber. Returns a guard that must be
/// held for the lifetime of the process — dropping it stops the
/// background flush thread for the file appender (if enabled).
pub fn init(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env("ASLAN_LOG")
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if !config.logging.file_enabled {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
        return None;
    }

    let log_dir = platform::get_log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "[aslan-browser] failed to create log dir {}: {}, logging to stderr only",
            log_dir.display(),
            e
        );
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "aslan-browser.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking.and(std::io::stderr))
        .with_env_filter(filter)
        .init();

    Some(guard)
}
