//! File-based logging initialization

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::{DebugConfig, DEFAULT_LOG_LEVEL};

/// Keeps the non-blocking log writer flushing until dropped.
#[must_use = "logs stop being written when the guard is dropped"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the logging system
///
/// Sets up:
/// - Daily log rotation in the configured directory
/// - Non-blocking file writes
/// - Optional stderr output (`LINEFEED_LOG_STDERR=1`)
/// - Panic hook that logs panics
///
/// Stdout is left alone; it carries the received lines.
pub fn init() -> LogGuard {
    let config = DebugConfig::from_env();

    let env_filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let (file_layer, file_guard) = match fs::create_dir_all(&config.log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false); // No ANSI codes in log files
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Warning: Failed to create log directory: {}", e);
            (None, None)
        }
    };

    // Source locations on stderr only when running at debug verbosity
    let verbose = config.is_debug_enabled();
    let stderr_layer = config.log_to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Warning: Logging already initialized: {}", e);
    }

    tracing::info!(
        log_file = %config.log_file().display(),
        log_level = %config.log_level,
        stderr = config.log_to_stderr,
        debug = verbose,
        "Logging initialized"
    );

    setup_panic_hook();

    LogGuard { _file: file_guard }
}

/// Set up panic hook to log panics with their location
fn setup_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic message".to_string()
        };

        tracing::error!(
            location = %location,
            message = %message,
            "Application panic"
        );

        default_panic(panic_info);
    }));
}
