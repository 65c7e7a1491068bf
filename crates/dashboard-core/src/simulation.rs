//! The interface a live simulation presents to the control plane.
//!
//! The engine itself is external. The control plane only needs to
//! enumerate its directories, read a few session values, run a small
//! set of actions, and observe the events each step produces. All of
//! it happens on the owner thread: the server never holds a
//! [`Simulation`] and reaches it only through closures handed to the
//! [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! View getters return `Result` so that partially constructed or
//! corrupt engine objects can be represented; see [`crate::extract`]
//! for how failures are defaulted.

use std::time::Duration;

use dashboard_types::{MapLayer, PlayerVitals};

/// A value could not be read from a simulation object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} unavailable: {reason}")]
pub struct ExtractError {
    /// Which field or field group failed.
    pub field: &'static str,
    /// What went wrong.
    pub reason: String,
}

impl ExtractError {
    /// Build an extraction error for `field`.
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// An owner-thread action could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// No player object exists (menu, loading screen).
    #[error("Player not available")]
    PlayerUnavailable,

    /// The target citizen does not exist.
    #[error("NPC not found")]
    NpcNotFound,

    /// No preset matches the requested name.
    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    /// The simulation refused or failed the action.
    #[error("{0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// Citizen view
// ---------------------------------------------------------------------------

/// Display names of a citizen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
}

/// Health state of a citizen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vitals {
    /// Current hit points.
    pub current: f32,
    /// Maximum hit points.
    pub max: f32,
    /// Whether the citizen is dead.
    pub is_dead: bool,
}

/// Job details of a citizen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Employment {
    /// Employer display name.
    pub employer: String,
    /// Job title.
    pub job_title: String,
    /// Salary text.
    pub salary: String,
    /// Employer address id, when employed.
    pub work_address_id: Option<i32>,
    /// Building the job is in.
    pub works_in_building: String,
    /// Working hours text.
    pub work_hours: String,
}

/// Where a citizen lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Home {
    /// Address display name.
    pub address: String,
    /// Address id, when housed.
    pub address_id: Option<i32>,
    /// Building display name.
    pub building: String,
    /// Floor display name.
    pub floor: String,
    /// Home telephone number.
    pub telephone: String,
}

/// Descriptive profile of a citizen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    /// Age in years.
    pub age_years: i32,
    /// Age bracket.
    pub age_group: String,
    /// Gender label.
    pub gender: String,
    /// Height in centimetres.
    pub height_cm: f32,
    /// Height bracket.
    pub height_category: String,
    /// Build label.
    pub build: String,
    /// Hair type.
    pub hair_type: String,
    /// Hair colour category.
    pub hair_color: String,
    /// Eye colour.
    pub eyes: String,
    /// Shoe size.
    pub shoe_size: i32,
    /// Birthday text.
    pub date_of_birth: String,
    /// Handwriting font name.
    pub handwriting: String,
}

/// Read access to one citizen object, valid for the duration of a borrow.
pub trait CitizenView {
    /// Entity id. A citizen whose id cannot be read is skipped entirely.
    fn id(&self) -> Result<i32, ExtractError>;
    /// Names.
    fn identity(&self) -> Result<Identity, ExtractError>;
    /// Portrait as PNG bytes, `None` when the citizen has no photo.
    fn photo_png(&self) -> Result<Option<Vec<u8>>, ExtractError>;
    /// Health.
    fn vitals(&self) -> Result<Vitals, ExtractError>;
    /// Job.
    fn employment(&self) -> Result<Employment, ExtractError>;
    /// Residence.
    fn home(&self) -> Result<Home, ExtractError>;
    /// Descriptors.
    fn profile(&self) -> Result<Profile, ExtractError>;
    /// Character trait names, e.g. `Quirk-FacialHair`.
    fn traits(&self) -> Result<Vec<String>, ExtractError>;
}

// ---------------------------------------------------------------------------
// Address view
// ---------------------------------------------------------------------------

/// Descriptive fields of an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDetails {
    /// Display name.
    pub name: String,
    /// Building display name.
    pub building_name: String,
    /// Floor display name.
    pub floor: String,
    /// Floor index, when known.
    pub floor_number: Option<i32>,
    /// Preset name.
    pub address_preset: String,
    /// Whether someone can live here.
    pub is_residence: bool,
    /// Interior design style.
    pub design_style: String,
    /// Number of rooms.
    pub room_count: i32,
}

/// A person attached to an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inhabitant {
    /// Entity id.
    pub id: i32,
    /// Given name.
    pub name: String,
    /// Family name, empty for non-citizens.
    pub surname: String,
    /// Portrait PNG.
    pub photo_png: Option<Vec<u8>>,
    /// Job title, if employed.
    pub job_title: Option<String>,
    /// Address id of the employer, if employed.
    pub employer_address_id: Option<i32>,
}

/// Read access to one address object.
pub trait AddressView {
    /// Entity id. An address whose id cannot be read is skipped entirely.
    fn id(&self) -> Result<i32, ExtractError>;
    /// Descriptive fields.
    fn details(&self) -> Result<AddressDetails, ExtractError>;
    /// Inhabitants in directory order.
    fn inhabitants(&self) -> Result<Vec<Inhabitant>, ExtractError>;
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Values captured once when a world finishes loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// Save file name.
    pub save_name: String,
    /// Murder modus operandi.
    pub murder_mo: String,
    /// City name.
    pub city_name: String,
}

/// In-game calendar position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameDate {
    /// Raw in-game clock.
    pub game_time: f32,
    /// Month, 1-12.
    pub month: i32,
    /// Day of month, 1-31.
    pub day: i32,
    /// Public-facing year.
    pub year: i32,
}

/// Something the owner thread observed while stepping the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A world finished loading; directories are ready to scan.
    WorldLoaded,
    /// The current world is about to be torn down.
    WorldUnloading,
    /// A citizen's hit points changed.
    HealthChanged {
        /// Citizen id.
        id: i32,
        /// New current hit points.
        current: f32,
        /// New maximum hit points.
        max: f32,
    },
    /// A citizen died.
    Died {
        /// Citizen id.
        id: i32,
        /// Display name, when readable.
        name: Option<String>,
    },
    /// A citizen was knocked out.
    KnockedOut {
        /// Citizen id.
        id: i32,
        /// Length of the knock-out in seconds.
        total_seconds: f32,
        /// Seconds remaining.
        remaining_seconds: f32,
    },
    /// Knock-out timer progress.
    KnockoutTick {
        /// Citizen id.
        id: i32,
        /// Seconds remaining.
        remaining_seconds: f32,
    },
    /// A citizen came round from a knock-out.
    Recovered {
        /// Citizen id.
        id: i32,
    },
    /// A new murderer was chosen.
    MurdererPicked {
        /// Citizen id.
        id: i32,
    },
    /// A new victim was chosen.
    VictimPicked {
        /// Citizen id.
        id: i32,
    },
}

/// A live simulation owned by exactly one thread.
pub trait Simulation {
    /// Every citizen, in directory order.
    fn citizens(&self) -> Vec<&dyn CitizenView>;

    /// Every address, in directory order.
    fn addresses(&self) -> Vec<&dyn AddressView>;

    /// Save, case and city names for the loaded world.
    fn session_info(&self) -> Result<SessionInfo, ExtractError>;

    /// In-game clock text.
    fn time_text(&self) -> Result<String, ExtractError>;

    /// In-game calendar position.
    fn game_date(&self) -> Result<GameDate, ExtractError>;

    /// Player vitals, `None` when there is no player.
    fn player_vitals(&self) -> Option<PlayerVitals>;

    /// Names of every preset the player may spawn.
    fn spawnable_presets(&self) -> Vec<String>;

    /// Create an item from `preset` in the player's inventory.
    ///
    /// `preset` is an exact name from [`Simulation::spawnable_presets`].
    fn spawn_into_inventory(&mut self, preset: &str) -> Result<(), ActionError>;

    /// Give the player the default starting inventory.
    fn spawn_default_inventory(&mut self) -> Result<(), ActionError>;

    /// Move the player next to citizen `npc_id`. Returns the citizen's display name.
    fn teleport_player_to(&mut self, npc_id: i32) -> Result<String, ActionError>;

    /// Move citizen `npc_id` in front of the player.
    fn teleport_npc_to_player(&mut self, npc_id: i32) -> Result<(), ActionError>;

    /// Render the map floor `ordinal` to PNG, `None` when rendering is unavailable.
    fn capture_map(
        &mut self,
        ordinal: i32,
        width: u32,
        height: u32,
        include_buildings: bool,
    ) -> Option<Vec<u8>>;

    /// Map layers and the active ordinal, `None` when the map is unavailable.
    fn map_layers(&self) -> Option<(Vec<MapLayer>, i32)>;

    /// Make layer `index` the active one. Returns the index now active.
    fn activate_map_layer(&mut self, index: i32) -> Option<i32>;

    /// Advance by `dt` and report what happened.
    fn step(&mut self, dt: Duration) -> Vec<SimEvent>;
}
