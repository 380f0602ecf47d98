// logging.rs - tracing subscriber setup

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the global subscriber: a stdout layer always, plus a daily
/// rolling file layer when `log_dir` is given. The returned guard must be
/// held for the life of the process or buffered file output is lost.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::new(level);
    let registry = tracing_subscriber::registry().with(filter);

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "orderflux.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_target(false)
                .with_writer(non_blocking)
                .with_ansi(false);
            let stdout_layer = fmt::layer().with_target(false);
            registry.with(file_layer).with(stdout_layer).init();
            Some(guard)
        }
        None => {
            let stdout_layer = fmt::layer().with_target(false);
            registry.with(stdout_layer).init();
            None
        }
    }
}
