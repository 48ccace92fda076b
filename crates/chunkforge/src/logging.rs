//! Dual logging setup: structured JSON to a rotating file, plain text to
//! stderr. Mirrors this codebase's server entry point, minus the MCP-specific
//! stdio considerations this CLI doesn't have.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Returns guards that must be kept alive for the duration of `main()` —
/// dropping them flushes and stops the background writer threads.
pub fn init(log_dir: &std::path::Path) -> anyhow::Result<(WorkerGuard, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "chunkforge.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    let multi_writer = file_writer.and(stderr_writer);

    tracing_subscriber::fmt()
        .json()
        .with_writer(multi_writer)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Ok((file_guard, stderr_guard))
}

/// Default log directory, OS-specific, matching this codebase's existing
/// server entry point conventions.
pub fn default_log_dir() -> std::path::PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(local_app_data) = std::env::var_os("LOCALAPPDATA") {
            std::path::PathBuf::from(local_app_data).join("chunkforge").join("logs")
        } else {
            std::path::PathBuf::from("logs")
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            home.join("Library").join("Logs").join("chunkforge")
        } else {
            std::path::PathBuf::from("logs")
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("chunkforge").join("logs")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".chunkforge").join("logs")
        } else {
            std::path::PathBuf::from("logs")
        }
    }
}
