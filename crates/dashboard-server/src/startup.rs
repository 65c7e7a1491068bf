//! Server startup helper for embedding in a host process.
//!
//! Provides [`spawn_dashboard`], which checks the configured address and
//! starts a [`RequestServer`] on the current Tokio runtime. The host
//! calls it once its owner thread is running.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dashboard_server::startup::spawn_dashboard;
//! use std::sync::Arc;
//!
//! let server = spawn_dashboard(Arc::new(state))?;
//! // ...
//! if let Some(server) = server {
//!     server.stop().await;
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::error::ServerError;
use crate::server::RequestServer;
use crate::state::AppState;

/// Errors that can occur when spawning the dashboard server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Start the dashboard server if it is enabled.
///
/// Returns `Ok(None)` when `server.enabled` is false.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the configured address does not
/// parse or cannot be bound.
pub fn spawn_dashboard(state: Arc<AppState>) -> Result<Option<RequestServer>, StartupError> {
    let settings = &state.settings;
    if !settings.enabled {
        info!("Dashboard server disabled by configuration");
        return Ok(None);
    }

    let addr_str = format!("{}:{}", settings.host, settings.port);
    let _: SocketAddr = addr_str.parse().map_err(|e| {
        StartupError::Server(ServerError::Bind(format!("invalid address {addr_str}: {e}")))
    })?;

    let server = RequestServer::new(state);
    let addr = server.start()?;
    info!(%addr, "Dashboard server spawned");
    Ok(Some(server))
}
