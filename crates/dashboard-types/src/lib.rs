//! Shared wire types for the dashboard control plane.
//!
//! Everything the request server sends to a client is defined here, so
//! the JSON shapes have a single source of truth. Types also flow to
//! `TypeScript` via `ts-rs` for the browser dashboard.
//!
//! # Modules
//!
//! - [`records`] -- Cached snapshot records (citizens, addresses, deaths,
//!   murder state, game metadata)
//! - [`player`] -- Raw player vitals and the derived status report
//! - [`logs`] -- Runtime log entries and log tail reports
//! - [`responses`] -- Envelopes for health, actions, deaths and map calls

pub mod logs;
pub mod player;
pub mod records;
pub mod responses;

pub use logs::{LogEntry, LogFileTail, LogLevel, RuntimeLogTail};
pub use player::{HealthReading, NeedsReading, PlayerStatus, PlayerVitals, StatusReading};
pub use records::{
    AddressRecord, AddressSummary, DEFAULT_SAVE_NAME, DeathRecord, GameMetadata, MurderState,
    NO_ID, NpcRecord, ResidentRecord,
};
pub use responses::{
    ActionOutcome, DeathList, HealthReport, InfoReport, MapActivation, MapCapture, MapLayer,
    MapLayerList, ReadFailure,
};
