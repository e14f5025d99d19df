//! Tracing subscriber setup: stdout plus a daily-rotated log file.
//! Used by: main.

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "turnstile.log";

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init(log_dir: &Path) -> std::io::Result<WorkerGuard> {
    let (subscriber, guard) = subscriber(log_dir)?;
    subscriber.init();
    Ok(guard)
}

/// Builds the subscriber without installing it, creating `log_dir` if needed.
pub fn subscriber(log_dir: &Path) -> std::io::Result<(impl Subscriber + Send + Sync + 'static, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer));

    Ok((subscriber, guard))
}
