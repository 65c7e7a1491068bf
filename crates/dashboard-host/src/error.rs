//! Error types for the host binary.
//!
//! [`HostError`] wraps every failure mode during startup and shutdown so
//! `main` can propagate with `?`.

use dashboard_core::config::ConfigError;
use dashboard_core::runner::RunnerError;
use dashboard_server::startup::StartupError;

/// Top-level error for the host binary.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The dashboard server failed to start.
    #[error("dashboard error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: StartupError,
    },

    /// The owner loop refused to run.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },

    /// The owner thread could not be spawned or died.
    #[error("owner thread error: {message}")]
    OwnerThread {
        /// Description of the failure.
        message: String,
    },

    /// Log file setup failed.
    #[error("log file error: {message}")]
    LogFile {
        /// Description of the failure.
        message: String,
    },
}
