//! Optional `tracing` subscriber for applications embedding the SDK.
//!
//! The SDK only emits events. Callers that already install a subscriber
//! can ignore this module entirely.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{LmError, LmResult};

/// File name prefix; the appender adds the date suffix.
const LOG_FILE_NAME: &str = "lawmatics-sdk.log";

/// Keeps the background file writer running. Pending lines are flushed
/// when it is dropped.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Filter for `level`, which may be a bare level ("warn") or a full
/// directive list ("info,lm_api=trace"). Unparseable input means "info".
fn directive_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level.trim()).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console output plus a file in `log_dir` that rolls over daily.
/// With `json_output` the file gets one JSON object per event.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool) -> LmResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;
    let (writer, worker) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME));

    let (json_file, text_file) = if json_output {
        (Some(json_file_layer(writer)), None)
    } else {
        (None, Some(text_file_layer(writer)))
    };

    tracing_subscriber::registry()
        .with(directive_filter(level))
        .with(fmt::layer().compact())
        .with(json_file)
        .with(text_file)
        .try_init()
        .map_err(|e| LmError::InvalidConfiguration(format!("subscriber already set: {e}")))?;

    tracing::info!(level, dir = %log_dir.display(), json_output, "file logging enabled");
    Ok(LogGuard { _worker: worker })
}

fn json_file_layer<S>(writer: NonBlocking) -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_current_span(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer)
}

fn text_file_layer<S>(writer: NonBlocking) -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer)
}

/// Apply a [`LoggingConfig`]. An empty `directory` means console only,
/// in which case no guard is returned.
pub fn init_from_config(config: &LoggingConfig) -> LmResult<Option<LogGuard>> {
    match config.directory.trim() {
        "" => {
            init_console_logging(&config.level);
            Ok(None)
        }
        dir => init_logging(&config.level, Path::new(dir), config.json_output).map(Some),
    }
}

/// Console-only subscriber. A no-op when one is already installed.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(directive_filter(level))
        .with(fmt::layer().compact())
        .try_init();
}
