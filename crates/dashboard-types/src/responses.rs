//! Response envelopes for the dashboard API.
//!
//! Cache reads serialize records directly; the types here cover the
//! endpoints that wrap results (health, actions, map rendering, deaths).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::records::DeathRecord;

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HealthReport {
    /// Always `"ok"`.
    pub status: String,
    /// Port the server is bound to.
    pub port: u16,
    /// Local server time in RFC 3339.
    pub time: String,
}

/// Body of `GET /api/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InfoReport {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Result of an owner-thread action such as a teleport or a spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionOutcome {
    /// Whether the action took effect.
    pub success: bool,
    /// Human-readable result.
    pub message: String,
}

impl ActionOutcome {
    /// A successful outcome.
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// A failed outcome.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// `{ok: false, message}` body used by owner-thread reads that fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReadFailure {
    /// Always `false`.
    pub ok: bool,
    /// Why the read failed.
    pub message: String,
}

impl ReadFailure {
    /// Build a failure body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Body of `GET /api/deaths`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeathList {
    /// Number of deaths currently retained.
    pub total: usize,
    /// Most recent deaths, newest first.
    pub deaths: Vec<DeathRecord>,
}

/// Body of `GET /api/map/capture64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MapCapture {
    /// Always `true`.
    pub ok: bool,
    /// Floor ordinal that was rendered.
    pub ordinal: i32,
    /// Image width in pixels.
    pub w: u32,
    /// Image height in pixels.
    pub h: u32,
    /// PNG as a `data:image/png;base64,...` URL.
    pub data_url: String,
}

/// One floor layer of the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MapLayer {
    /// Position among the map's layers.
    pub index: i32,
    /// Floor ordinal the layer represents.
    pub ordinal: i32,
    /// Layer name.
    pub name: String,
    /// Whether the layer itself is enabled.
    pub active_self: bool,
    /// Whether the layer and all its parents are enabled.
    pub active_in_hierarchy: bool,
    /// Number of child objects in the layer.
    pub child_count: i32,
}

/// Body of `GET /api/map/layers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MapLayerList {
    /// Always `true`.
    pub ok: bool,
    /// Layers in map order.
    pub layers: Vec<MapLayer>,
    /// Ordinal of the active layer.
    pub active_ordinal: i32,
}

/// Body of `POST /api/map/activate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MapActivation {
    /// Always `true`.
    pub ok: bool,
    /// Index of the layer now active.
    pub active_index: i32,
}
