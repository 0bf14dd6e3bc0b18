//! Logging setup: stderr for one-shot commands, a file while the TUI owns the terminal

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// File-based logging for the TUI. Default: WARN level, RUST_LOG override.
/// If setup fails, prints a warning to stderr and continues without logging.
pub fn init_file(log_path: &Path) {
    if let Err(e) = init_file_inner(log_path) {
        eprintln!("Warning: failed to set up file logging: {e}");
    }
}

fn init_file_inner(log_path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(log_file))
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_ansi(false)
        .try_init()?;

    Ok(())
}
