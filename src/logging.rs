use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

#[cfg(feature = "debug-log")]
mod inner {
    use super::*;
    use std::fs;
    use tracing_appender::non_blocking::WorkerGuard;

    static LOG_PATH: std::sync::OnceLock<PathBuf> = std::sync::OnceLock::new();

    pub type LogGuard = WorkerGuard;

    /// Console output plus a JSON debug log next to the binary's working
    /// directory. Keep the guard alive for the lifetime of the process.
    pub fn init(verbose: bool) -> Option<LogGuard> {
        let log_path = PathBuf::from("kbchat-debug.log");

        let file = match fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Failed to open log file: {e}");
                return None;
            }
        };

        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(verbose))
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            );

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("Failed to set tracing subscriber");
            return None;
        }

        LOG_PATH.set(log_path).ok();
        tracing::info!("Debug logging initialized");

        Some(guard)
    }

    pub fn log_file_path() -> Option<&'static PathBuf> {
        LOG_PATH.get()
    }
}

#[cfg(not(feature = "debug-log"))]
mod inner {
    use super::*;

    pub type LogGuard = ();

    pub fn init(verbose: bool) -> Option<LogGuard> {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter(verbose))
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true));

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("Failed to set tracing subscriber");
        }
        None
    }

    #[inline(always)]
    pub fn log_file_path() -> Option<&'static PathBuf> {
        None
    }
}

pub use inner::*;
