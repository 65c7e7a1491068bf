//! Shared application state for the request server.
//!
//! [`AppState`] holds everything a request handler may touch: the
//! snapshot caches (read-only from here), the runtime log buffer, and the
//! dispatcher used to reach the owner thread. It never holds the
//! simulation itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use dashboard_core::caches::Caches;
use dashboard_core::config::{DashboardConfig, DispatchConfig, LogsConfig, ServerSettings};
use dashboard_core::dispatcher::Dispatcher;
use dashboard_core::log_buffer::RuntimeLogBuffer;
use dashboard_core::simulation::Simulation;

use crate::http::Limits;

/// Shared state for every connection task.
#[derive(Debug)]
pub struct AppState {
    /// Snapshot caches kept current by the owner thread.
    pub caches: Arc<Caches>,
    /// In-memory log lines.
    pub runtime_logs: Arc<RuntimeLogBuffer>,
    /// Route to the owner thread.
    pub dispatcher: Dispatcher<dyn Simulation>,
    /// Server settings.
    pub settings: ServerSettings,
    /// Owner-thread timeouts.
    pub dispatch: DispatchConfig,
    /// Log endpoint settings.
    pub logs: LogsConfig,
    /// Port actually bound, once listening.
    bound_port: AtomicU16,
}

impl AppState {
    /// Assemble state from its parts and the loaded configuration.
    pub fn new(
        caches: Arc<Caches>,
        runtime_logs: Arc<RuntimeLogBuffer>,
        dispatcher: Dispatcher<dyn Simulation>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            caches,
            runtime_logs,
            dispatcher,
            settings: config.server.clone(),
            dispatch: config.dispatch,
            logs: config.logs.clone(),
            bound_port: AtomicU16::new(config.server.port),
        }
    }

    /// Port reported by `/api/health`.
    pub fn port(&self) -> u16 {
        self.bound_port.load(Ordering::Acquire)
    }

    /// Record the port the listener actually bound.
    pub fn set_port(&self, port: u16) {
        self.bound_port.store(port, Ordering::Release);
    }

    /// Request size limits from the settings.
    pub const fn limits(&self) -> Limits {
        Limits {
            max_header_bytes: self.settings.max_header_bytes,
            max_body_bytes: self.settings.max_body_bytes,
        }
    }
}
