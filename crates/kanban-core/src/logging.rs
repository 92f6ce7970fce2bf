//! Tracing subscriber bootstrap shared by the binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming a file that receives verbose debug logs.
pub const DEBUG_LOG_ENV: &str = "KANBAN_DEBUG_LOG";

/// Install the global subscriber.
///
/// When `KANBAN_DEBUG_LOG` points at a file, everything at DEBUG and above is
/// appended there with source locations. Otherwise logs go to stderr, filtered
/// by `RUST_LOG` or `default_level`.
pub fn init(default_level: &str) -> std::io::Result<()> {
    if let Ok(log_path) = std::env::var(DEBUG_LOG_ENV) {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}
