//! Tracing configuration and log routing.
//!
//! Events go to stdout through a compact formatter and to a log file. The file path comes from
//! [`Config::log_file`](crate::config::Config::log_file); without one, the file logger writes to
//! `logs/pdfchat.log`. File output goes through a non-blocking writer so request handlers never
//! wait on disk.
//!
//! Every pipeline operation runs inside a [`session_span`], so upload, chat and wipe events of
//! one session can be grepped by `session_id` in either sink.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::Span;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "pdfchat.log";

/// Filter applied when `RUST_LOG` is unset: service and request traces at `info`, dependencies
/// at `warn`.
pub const DEFAULT_FILTER: &str = "warn,pdfchat=info,tower_http=info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and file logging.
///
/// - Respects `RUST_LOG` for filtering, falling back to [`DEFAULT_FILTER`].
/// - Appends to `log_file` when given, else to `logs/pdfchat.log`.
/// - Parks the non-blocking writer guard in a static so buffered lines flush at exit.
pub fn init_tracing(log_file: Option<&str>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    match open_log_file(&resolve_log_path(log_file)) {
        Ok(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        Err(err) => {
            registry.init();
            tracing::warn!(error = %err, "File logging disabled");
        }
    }
}

/// Span carried by every pipeline operation on a session.
pub fn session_span(operation: &'static str, session_id: &str) -> Span {
    tracing::info_span!("session", operation, session_id)
}

fn resolve_log_path(log_file: Option<&str>) -> PathBuf {
    match log_file.map(str::trim).filter(|path| !path.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE),
    }
}

fn open_log_file(path: &Path) -> std::io::Result<NonBlocking> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    Ok(non_blocking)
}
