//! Snapshot records copied out of the live simulation.
//!
//! Every record here is plain data: the owner thread builds or patches
//! it under a cache lock and readers only ever see whole copies. Field
//! names serialize in `camelCase` to match the dashboard front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Sentinel used for "no entity" in id-valued fields.
pub const NO_ID: i32 = -1;

/// Save name reported before any world has been loaded.
pub const DEFAULT_SAVE_NAME: &str = "DEFAULT_SAVE";

// ---------------------------------------------------------------------------
// Citizens
// ---------------------------------------------------------------------------

/// One citizen as last seen by the owner thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct NpcRecord {
    /// Stable citizen id.
    pub id: i32,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Portrait as a `data:image/png;base64,...` URL, empty when unavailable.
    pub photo: String,
    /// Current hit points.
    pub hp_current: f32,
    /// Maximum hit points.
    pub hp_max: f32,
    /// Whether the citizen is dead.
    pub is_dead: bool,
    /// Whether the citizen is knocked out.
    pub is_ko: bool,
    /// Seconds left on the current knock-out, never negative.
    pub ko_remaining_seconds: f32,
    /// Total length of the current knock-out, never negative.
    pub ko_total_seconds: f32,
    /// Employer display name.
    pub employer: String,
    /// Job title at the employer.
    pub job_title: String,
    /// Salary as the simulation formats it.
    pub salary: String,
    /// Address id of the employer, or [`NO_ID`].
    pub work_address_id: i32,
    /// Home address display name.
    pub home_address: String,
    /// Home address id, or [`NO_ID`].
    pub home_address_id: i32,
    /// Age in whole years.
    pub age_years: i32,
    /// Coarse age bracket.
    pub age_group: String,
    /// Gender label.
    pub gender: String,
    /// Height in centimetres, rounded.
    pub height_cm: i32,
    /// Height bracket label.
    pub height_category: String,
    /// Body build label.
    pub build: String,
    /// Hair type label.
    pub hair_type: String,
    /// Hair colour category.
    pub hair_color: String,
    /// Eye colour.
    pub eyes: String,
    /// Shoe size.
    pub shoe_size: i32,
    /// Wears glasses (short- or far-sighted).
    pub glasses: bool,
    /// Has facial hair.
    pub facial_hair: bool,
    /// Birthday as the simulation formats it.
    pub date_of_birth: String,
    /// Home telephone number.
    pub telephone_number: String,
    /// Display name of the building the citizen lives in.
    pub lives_in_building: String,
    /// Display name of the floor the citizen lives on.
    pub lives_on_floor: String,
    /// Display name of the building the citizen works in.
    pub works_in_building: String,
    /// Working hours as the simulation formats them.
    pub work_hours: String,
    /// Handwriting font name.
    pub handwriting: String,
}

impl NpcRecord {
    /// A record carrying only an id, every other field defaulted.
    ///
    /// Extraction starts from this and fills in what the source yields.
    pub fn blank(id: i32) -> Self {
        Self {
            id,
            name: String::new(),
            surname: String::new(),
            photo: String::new(),
            hp_current: 0.0,
            hp_max: 0.0,
            is_dead: false,
            is_ko: false,
            ko_remaining_seconds: 0.0,
            ko_total_seconds: 0.0,
            employer: String::new(),
            job_title: String::new(),
            salary: String::new(),
            work_address_id: NO_ID,
            home_address: String::new(),
            home_address_id: NO_ID,
            age_years: 0,
            age_group: String::new(),
            gender: String::new(),
            height_cm: 0,
            height_category: String::new(),
            build: String::new(),
            hair_type: String::new(),
            hair_color: String::new(),
            eyes: String::new(),
            shoe_size: 0,
            glasses: false,
            facial_hair: false,
            date_of_birth: String::new(),
            telephone_number: String::new(),
            lives_in_building: String::new(),
            lives_on_floor: String::new(),
            works_in_building: String::new(),
            work_hours: String::new(),
            handwriting: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// A person living or working at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ResidentRecord {
    /// Citizen id.
    pub id: i32,
    /// Given name.
    pub name: String,
    /// Family name, empty for non-citizen inhabitants.
    pub surname: String,
    /// Portrait data URL, empty when unavailable.
    pub photo: String,
    /// Job title, set only when this address is the resident's workplace.
    pub job_title: String,
}

/// An address with its inhabitants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AddressRecord {
    /// Address id.
    pub id: i32,
    /// Address display name.
    pub name: String,
    /// Building display name.
    pub building_name: String,
    /// Floor display name.
    pub floor: String,
    /// Floor index, or [`NO_ID`] when unknown.
    pub floor_number: i32,
    /// Address preset name.
    pub address_preset: String,
    /// Whether the address is a residence.
    pub is_residence: bool,
    /// Interior design style name.
    pub design_style: String,
    /// Number of rooms.
    pub room_count: i32,
    /// Inhabitants in directory order.
    pub residents: Vec<ResidentRecord>,
}

impl AddressRecord {
    /// A record carrying only an id, every other field defaulted.
    pub const fn blank(id: i32) -> Self {
        Self {
            id,
            name: String::new(),
            building_name: String::new(),
            floor: String::new(),
            floor_number: NO_ID,
            address_preset: String::new(),
            is_residence: false,
            design_style: String::new(),
            room_count: 0,
            residents: Vec::new(),
        }
    }
}

/// Address list entry: an [`AddressRecord`] with residents reduced to a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AddressSummary {
    /// Address id.
    pub id: i32,
    /// Address display name.
    pub name: String,
    /// Building display name.
    pub building_name: String,
    /// Floor display name.
    pub floor: String,
    /// Floor index.
    pub floor_number: i32,
    /// Address preset name.
    pub address_preset: String,
    /// Whether the address is a residence.
    pub is_residence: bool,
    /// Number of inhabitants.
    pub resident_count: usize,
    /// Interior design style name.
    pub design_style: String,
    /// Number of rooms.
    pub room_count: i32,
}

impl From<&AddressRecord> for AddressSummary {
    fn from(record: &AddressRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            building_name: record.building_name.clone(),
            floor: record.floor.clone(),
            floor_number: record.floor_number,
            address_preset: record.address_preset.clone(),
            is_residence: record.is_residence,
            resident_count: record.residents.len(),
            design_style: record.design_style.clone(),
            room_count: record.room_count,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived state
// ---------------------------------------------------------------------------

/// One entry of the bounded death log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct DeathRecord {
    /// Id of the citizen who died.
    pub human_id: i32,
    /// Display name, `"Unknown"` when the source had none.
    pub name: String,
    /// Wall-clock time the death was recorded.
    pub timestamp: DateTime<Utc>,
    /// In-game clock value at the time of death.
    pub game_time: f32,
    /// In-game month, 1-12 (0 when unknown).
    pub game_month: i32,
    /// In-game day of month, 1-31 (0 when unknown).
    pub game_day: i32,
    /// In-game public year (0 when unknown).
    pub game_year: i32,
}

/// Current murderer and victim, each independently settable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct MurderState {
    /// Current murderer id, or [`NO_ID`].
    pub murderer_id: i32,
    /// Current victim id, or [`NO_ID`].
    pub victim_id: i32,
    /// When either slot last changed. `None` until the first change.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for MurderState {
    fn default() -> Self {
        Self {
            murderer_id: NO_ID,
            victim_id: NO_ID,
            last_updated: None,
        }
    }
}

/// Session-level metadata for the loaded world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameMetadata {
    /// Save file name.
    pub save_name: String,
    /// Murder modus operandi for the current case.
    #[serde(rename = "murderMO")]
    pub murder_mo: String,
    /// In-game clock text, refreshed every tick.
    pub time_text: String,
    /// City name.
    pub city_name: String,
    /// Whether a world is loaded and base info has been captured.
    pub ready: bool,
}

impl Default for GameMetadata {
    fn default() -> Self {
        Self {
            save_name: String::from(DEFAULT_SAVE_NAME),
            murder_mo: String::new(),
            time_text: String::new(),
            city_name: String::new(),
            ready: false,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn npc_record_uses_front_end_field_names() {
        let record = NpcRecord::blank(12);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 12);
        assert_eq!(json["hpCurrent"], 0.0);
        assert_eq!(json["koRemainingSeconds"], 0.0);
        assert_eq!(json["workAddressId"], NO_ID);
        assert_eq!(json["homeAddressId"], NO_ID);
        assert!(json.get("dateOfBirth").is_some());
        assert!(json.get("hp_current").is_none());
    }

    #[test]
    fn game_metadata_defaults_to_placeholder_save() {
        let meta = GameMetadata::default();
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["saveName"], DEFAULT_SAVE_NAME);
        assert_eq!(json["murderMO"], "");
        assert_eq!(json["ready"], false);
    }

    #[test]
    fn summary_counts_residents() {
        let mut address = AddressRecord::blank(3);
        address.residents.push(ResidentRecord {
            id: 1,
            name: String::from("Ada"),
            surname: String::from("Lane"),
            photo: String::new(),
            job_title: String::new(),
        });
        let summary = AddressSummary::from(&address);
        assert_eq!(summary.resident_count, 1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["residentCount"], 1);
        assert!(json.get("residents").is_none());
    }

    #[test]
    fn murder_state_starts_unset() {
        let state = MurderState::default();
        assert_eq!(state.murderer_id, NO_ID);
        assert_eq!(state.victim_id, NO_ID);
        assert!(state.last_updated.is_none());
    }
}
