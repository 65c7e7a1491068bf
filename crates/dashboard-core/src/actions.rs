//! Bodies of the owner-thread actions exposed over HTTP.
//!
//! Each function takes the live simulation and is meant to run inside a
//! dispatched closure. None of them touch the caches.

use dashboard_types::{MapActivation, MapLayerList, PlayerStatus};

use crate::directory::cmp_ignore_case;
use crate::simulation::{ActionError, Simulation};

/// Smallest map render edge in pixels.
pub const MIN_MAP_SIZE: u32 = 64;
/// Largest map render edge in pixels.
pub const MAX_MAP_SIZE: u32 = 4096;
/// Map render edge used when none is requested.
pub const DEFAULT_MAP_SIZE: u32 = 1024;
/// Floor ordinal meaning "whatever floor is active".
pub const ACTIVE_FLOOR: i32 = -1;

/// Move the player to citizen `npc_id`.
///
/// # Errors
///
/// Propagates the simulation's [`ActionError`].
pub fn teleport_player(sim: &mut dyn Simulation, npc_id: i32) -> Result<String, ActionError> {
    let name = sim.teleport_player_to(npc_id)?;
    Ok(format!("Player teleported to {name}"))
}

/// Bring citizen `npc_id` to the player.
///
/// # Errors
///
/// Propagates the simulation's [`ActionError`].
pub fn teleport_npc(sim: &mut dyn Simulation, npc_id: i32) -> Result<String, ActionError> {
    sim.teleport_npc_to_player(npc_id)?;
    Ok(String::from("NPC teleported to player"))
}

/// Current player status.
///
/// # Errors
///
/// [`ActionError::PlayerUnavailable`] when there is no player.
pub fn player_status(sim: &dyn Simulation) -> Result<PlayerStatus, ActionError> {
    sim.player_vitals()
        .map(|vitals| PlayerStatus::from(&vitals))
        .ok_or(ActionError::PlayerUnavailable)
}

/// Spawnable preset names in case-insensitive order.
pub fn sorted_presets(sim: &dyn Simulation) -> Vec<String> {
    let mut presets = sim.spawnable_presets();
    presets.sort_by(|a, b| cmp_ignore_case(a, b));
    presets
}

/// Spawn the preset whose name matches `requested`, ignoring case.
///
/// # Errors
///
/// - [`ActionError::PlayerUnavailable`] when there is no player
/// - [`ActionError::PresetNotFound`] when no preset matches
/// - whatever the simulation reports for the spawn itself
pub fn spawn_item(sim: &mut dyn Simulation, requested: &str) -> Result<String, ActionError> {
    if sim.player_vitals().is_none() {
        return Err(ActionError::PlayerUnavailable);
    }
    let requested = requested.trim();
    let preset = sim
        .spawnable_presets()
        .into_iter()
        .find(|p| cmp_ignore_case(p, requested).is_eq())
        .ok_or_else(|| ActionError::PresetNotFound(requested.to_owned()))?;
    sim.spawn_into_inventory(&preset)?;
    Ok(format!("Spawned '{preset}' to inventory."))
}

/// Give the player the default inventory.
///
/// # Errors
///
/// [`ActionError::PlayerUnavailable`] when there is no player, or the
/// simulation's own failure.
pub fn spawn_default(sim: &mut dyn Simulation) -> Result<String, ActionError> {
    if sim.player_vitals().is_none() {
        return Err(ActionError::PlayerUnavailable);
    }
    sim.spawn_default_inventory()?;
    Ok(String::from("Spawned default inventory items."))
}

/// A validated map render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRequest {
    /// Floor ordinal, [`ACTIVE_FLOOR`] for the active one.
    pub ordinal: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether buildings are drawn.
    pub include_buildings: bool,
}

impl MapRequest {
    /// Build a request, defaulting absent values and clamping sizes.
    pub fn new(
        ordinal: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
        include_buildings: bool,
    ) -> Self {
        let edge = |v: Option<u32>| v.unwrap_or(DEFAULT_MAP_SIZE).clamp(MIN_MAP_SIZE, MAX_MAP_SIZE);
        Self {
            ordinal: ordinal.unwrap_or(ACTIVE_FLOOR),
            width: edge(width),
            height: edge(height),
            include_buildings,
        }
    }
}

impl Default for MapRequest {
    fn default() -> Self {
        Self::new(None, None, None, false)
    }
}

/// Render the map as PNG bytes, `None` when rendering is unavailable.
pub fn capture_map(sim: &mut dyn Simulation, request: MapRequest) -> Option<Vec<u8>> {
    sim.capture_map(
        request.ordinal,
        request.width,
        request.height,
        request.include_buildings,
    )
    .filter(|png| !png.is_empty())
}

/// Map layers, `None` when the map is unavailable.
pub fn map_layers(sim: &dyn Simulation) -> Option<MapLayerList> {
    sim.map_layers().map(|(layers, active_ordinal)| MapLayerList {
        ok: true,
        layers,
        active_ordinal,
    })
}

/// Activate layer `index`, `None` when the map is unavailable.
pub fn activate_map_layer(sim: &mut dyn Simulation, index: i32) -> Option<MapActivation> {
    sim.activate_map_layer(index).map(|active_index| MapActivation {
        ok: true,
        active_index,
    })
}
