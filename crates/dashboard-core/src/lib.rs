//! Caches, owner-thread dispatch and simulation hooks for the dashboard.
//!
//! The simulation lives on one owner thread. Everything else reaches it
//! in one of two ways: by reading a snapshot cache the owner thread keeps
//! current, or by handing a closure to the [`Dispatcher`] and waiting for
//! the owner thread to run it.
//!
//! # Modules
//!
//! - [`cache`] -- Generic mutex-guarded [`SnapshotCache`] and [`SnapshotCell`]
//! - [`directory`] -- Citizen and address caches with field-level patches
//! - [`death_log`] -- Bounded log of recent deaths
//! - [`murder`] -- Current murderer and victim
//! - [`game_state`] -- Session metadata
//! - [`caches`] -- All of the above, built together
//! - [`dispatcher`] -- Multi-producer queue of closures run on the owner thread
//! - [`simulation`] -- The [`Simulation`] trait the host implements
//! - [`extract`] -- Best-effort conversion of simulation views into records
//! - [`actions`] -- Owner-thread bodies of the HTTP actions
//! - [`hooks`] -- Tick callback that applies simulation events to the caches
//! - [`runner`] -- The owner-thread loop
//! - [`control`] -- Atomic controls for the owner loop
//! - [`log_buffer`] -- Runtime log ring buffer and its `tracing` layer
//! - [`log_tail`] -- Tailing log files on disk
//! - [`config`] -- YAML configuration
//!
//! [`Dispatcher`]: dispatcher::Dispatcher
//! [`SnapshotCache`]: cache::SnapshotCache
//! [`SnapshotCell`]: cache::SnapshotCell
//! [`Simulation`]: simulation::Simulation

pub mod actions;
pub mod cache;
pub mod caches;
pub mod config;
pub mod control;
pub mod death_log;
pub mod directory;
pub mod dispatcher;
pub mod extract;
pub mod game_state;
pub mod hooks;
pub mod log_buffer;
pub mod log_tail;
pub mod murder;
pub mod runner;
pub mod simulation;

#[cfg(test)]
mod testing;
