//! Logging and tracing configuration
//!
//! Every invocation appends to `<workspace>/mqgo.log`. Warnings and errors are
//! also echoed to stderr so they aren't only visible in the log file.

use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, EnvFilter, Layer,
};

use super::paths::LOG_FILE;

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("mqgo=debug,info")
        } else {
            EnvFilter::new("mqgo=info,warn")
        }
    })
}

/// Warnings and errors on stderr
fn stderr_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(LevelFilter::WARN)
}

/// Initialize tracing for one invocation
///
/// When `workspace` is an existing directory, logs go to `mqgo.log` inside it.
/// Otherwise (the workspace is about to be reported as missing) only stderr
/// is used. Hold the returned guard until exit so buffered lines get flushed.
pub fn init(workspace: &Path, verbose: bool) -> Option<WorkerGuard> {
    if workspace.is_dir() {
        let appender = tracing_appender::rolling::never(workspace, LOG_FILE);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter(verbose));

        let _ = tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer())
            .try_init();

        return Some(guard);
    }

    let _ = tracing_subscriber::registry()
        .with(stderr_layer())
        .try_init();

    None
}
