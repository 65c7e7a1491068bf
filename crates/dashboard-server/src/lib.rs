//! Loopback HTTP server for the dashboard control plane.
//!
//! This crate serves:
//!
//! - **Cache reads** (`/api/npcs`, `/api/addresses`, `/api/deaths`, ...)
//!   answered from snapshot caches without touching the simulation
//! - **Owner-thread calls** (`/api/npc/{id}/{action}`, `/api/player/*`,
//!   `/api/map/*`) run on the simulation's owner thread through the
//!   [`Dispatcher`](dashboard_core::dispatcher::Dispatcher), each with a
//!   timeout
//! - **Log tails** from files and from the in-memory runtime buffer
//! - **Static files** for the dashboard UI, confined to one root
//!
//! # Architecture
//!
//! HTTP/1.1 is parsed by hand in [`http`]: one request per connection,
//! `Connection: close` on every response, permissive CORS headers. Every
//! connection runs on its own Tokio task, so a slow or panicking handler
//! never stalls the accept loop.

pub mod actions;
pub mod error;
pub mod handlers;
pub mod http;
pub mod query;
pub mod response;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod static_files;

pub use error::{ApiError, ServerError};
pub use router::route;
pub use server::RequestServer;
pub use startup::{StartupError, spawn_dashboard};
pub use state::AppState;
