//! Generated city that stands in for a live simulation.
//!
//! Citizens, homes and workplaces are drawn from fixed name pools with a
//! seeded RNG, so a given seed always produces the same city. Each step
//! advances a game clock and occasionally stages an incident: a citizen
//! is hurt, knocked out, or, if they are the current victim, killed.
//! The first step reports [`SimEvent::WorldLoaded`] and picks the case.

use std::time::Duration;

use dashboard_core::config::SimulationConfig;
use dashboard_core::simulation::{
    ActionError, AddressDetails, AddressView, CitizenView, Employment, ExtractError, GameDate,
    Home, Identity, Inhabitant, Profile, SessionInfo, SimEvent, Simulation, Vitals,
};
use dashboard_types::{MapLayer, PlayerVitals};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

// -----------------------------------------------------------------------
// Pools
// -----------------------------------------------------------------------

const GIVEN_NAMES: &[&str] = &[
    "Ada", "Bram", "Cora", "Dell", "Edie", "Finn", "Greta", "Hal", "Ines", "Jonah", "Kit",
    "Lena", "Milo", "Nell", "Otto", "Pia", "Quinn", "Rosa", "Sol", "Tess", "Uri", "Vera",
    "Walt", "Yara",
];

const SURNAMES: &[&str] = &[
    "Abbott", "Brandt", "Castell", "Doyle", "Ekberg", "Fairley", "Grist", "Holt", "Ivers",
    "Jansen", "Kessler", "Lowe", "Marek", "Novak", "Orme", "Pryce", "Quayle", "Rusk", "Sandor",
    "Thorne", "Vance", "Wilde",
];

const STREETS: &[&str] = &["Harbour Row", "Tallow Street", "Gate Lane", "Mercer Walk", "Canal Side"];

/// `(business, building)` pairs.
const WORKPLACES: &[(&str, &str)] = &[
    ("Kessler & Sons", "Mercer House"),
    ("Quay Diner", "Harbour Arcade"),
    ("City Hall", "Civic Tower"),
    ("Harbour Works", "Dock Sheds"),
    ("Ferris Pharmacy", "Harbour Arcade"),
    ("Blue Note Bar", "Gate Chambers"),
];

const JOB_TITLES: &[&str] = &[
    "Clerk", "Cook", "Dock Hand", "Pharmacist", "Bartender", "Accountant", "Janitor", "Manager",
];

const MURDER_MOS: &[&str] = &["Strangler", "Poisoner", "Sniper", "Shiv"];
const BUILDS: &[&str] = &["Skinny", "Average", "Athletic", "Heavy"];
const HAIR_TYPES: &[&str] = &["Short", "Long", "Curly", "Bald"];
const HAIR_COLORS: &[&str] = &["Black", "Brown", "Blonde", "Red", "Grey"];
const EYES: &[&str] = &["Blue", "Brown", "Green", "Grey"];
const GENDERS: &[&str] = &["Male", "Female", "Non-binary"];
const HANDWRITING: &[&str] = &["Gochi Hand", "Kalam", "Caveat", "Reenie Beanie"];
const DESIGN_STYLES: &[&str] = &["Modern", "Rustic", "Art Deco", "Industrial"];

const PRESETS: &[&str] = &[
    "Crowbar", "Lockpick", "Apple", "Baguette", "Coffee", "Flashlight", "Handgun", "Bandage",
];

const DEFAULT_INVENTORY: &[&str] = &["Flashlight", "Bandage", "Coffee"];

/// `(name, ordinal)` of each map layer, in map order.
const MAP_LAYERS: &[(&str, i32)] = &[
    ("Basement", -1),
    ("Ground", 0),
    ("First Floor", 1),
    ("Second Floor", 2),
];

/// 1x1 transparent PNG returned by map captures.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

const FIRST_ADDRESS_ID: i32 = 1000;
const KNOCKOUT_SECONDS: f32 = 30.0;
const INCIDENT_CHANCE: f64 = 0.02;
const EMPLOYMENT_CHANCE: f64 = 0.7;
/// Game clock at load: 08:00 on day one.
const START_MINUTES: u64 = 480;

fn pick(rng: &mut StdRng, pool: &[&'static str]) -> &'static str {
    pool.get(rng.random_range(0..pool.len()))
        .copied()
        .unwrap_or_default()
}

// -----------------------------------------------------------------------
// Citizens and addresses
// -----------------------------------------------------------------------

#[derive(Debug)]
struct DemoCitizen {
    id: i32,
    identity: Identity,
    hp: f32,
    max_hp: f32,
    dead: bool,
    /// Seconds left unconscious.
    knockout: Option<f32>,
    employment: Employment,
    home: Home,
    profile: Profile,
    traits: Vec<String>,
}

impl DemoCitizen {
    fn full_name(&self) -> String {
        format!("{} {}", self.identity.name, self.identity.surname)
    }

    const fn is_available(&self) -> bool {
        !self.dead && self.knockout.is_none()
    }
}

impl CitizenView for DemoCitizen {
    fn id(&self) -> Result<i32, ExtractError> {
        Ok(self.id)
    }
    fn identity(&self) -> Result<Identity, ExtractError> {
        Ok(self.identity.clone())
    }
    fn photo_png(&self) -> Result<Option<Vec<u8>>, ExtractError> {
        Ok(None)
    }
    fn vitals(&self) -> Result<Vitals, ExtractError> {
        Ok(Vitals {
            current: self.hp,
            max: self.max_hp,
            is_dead: self.dead,
        })
    }
    fn employment(&self) -> Result<Employment, ExtractError> {
        Ok(self.employment.clone())
    }
    fn home(&self) -> Result<Home, ExtractError> {
        Ok(self.home.clone())
    }
    fn profile(&self) -> Result<Profile, ExtractError> {
        Ok(self.profile.clone())
    }
    fn traits(&self) -> Result<Vec<String>, ExtractError> {
        Ok(self.traits.clone())
    }
}

#[derive(Debug)]
struct DemoAddress {
    id: i32,
    details: AddressDetails,
    inhabitants: Vec<Inhabitant>,
}

impl AddressView for DemoAddress {
    fn id(&self) -> Result<i32, ExtractError> {
        Ok(self.id)
    }
    fn details(&self) -> Result<AddressDetails, ExtractError> {
        Ok(self.details.clone())
    }
    fn inhabitants(&self) -> Result<Vec<Inhabitant>, ExtractError> {
        Ok(self.inhabitants.clone())
    }
}

// -----------------------------------------------------------------------
// City
// -----------------------------------------------------------------------

/// The demo simulation driven by the host's owner thread.
#[derive(Debug)]
pub struct DemoCity {
    rng: StdRng,
    seed: u64,
    murder_mo: &'static str,
    citizens: Vec<DemoCitizen>,
    addresses: Vec<DemoAddress>,
    player: PlayerVitals,
    inventory: Vec<String>,
    active_layer: usize,
    loaded: bool,
    elapsed_ms: u64,
    victim: Option<i32>,
}

impl DemoCity {
    /// Generate a city from `config.seed` with `config.citizen_count` citizens.
    pub fn generate(config: &SimulationConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut addresses = workplaces(&mut rng);
        let first_residence = addresses.len();
        let residence_count = (config.citizen_count / 3).max(1);
        let mut address_id = addresses
            .last()
            .map_or(FIRST_ADDRESS_ID, |a| a.id.saturating_add(1));
        for number in 1..=residence_count {
            addresses.push(residence(&mut rng, address_id, number));
            address_id = address_id.saturating_add(1);
        }

        let mut citizens = Vec::new();
        let mut citizen_id: i32 = 1;
        for _ in 0..config.citizen_count {
            let home_index = rng.random_range(first_residence..addresses.len());
            let work_index = rng
                .random_bool(EMPLOYMENT_CHANCE)
                .then(|| rng.random_range(0..first_residence));
            let citizen = citizen(&mut rng, citizen_id, &addresses, home_index, work_index);
            if let Some(home) = addresses.get_mut(home_index) {
                home.inhabitants.push(inhabitant(&citizen));
            }
            if let Some(work) = work_index.and_then(|i| addresses.get_mut(i)) {
                work.inhabitants.push(inhabitant(&citizen));
            }
            citizens.push(citizen);
            citizen_id = citizen_id.saturating_add(1);
        }

        info!(
            seed = config.seed,
            citizens = citizens.len(),
            addresses = addresses.len(),
            "Demo city generated"
        );

        Self {
            murder_mo: pick(&mut rng, MURDER_MOS),
            rng,
            seed: config.seed,
            citizens,
            addresses,
            player: PlayerVitals {
                current_health: 80.0,
                max_health: 100.0,
                maximum_health: 100.0,
                nourishment: 0.7,
                hydration: 0.6,
                energy: 0.5,
                hygiene: 0.9,
                heat: 0.8,
                ..PlayerVitals::default()
            },
            inventory: Vec::new(),
            active_layer: 1,
            loaded: false,
            elapsed_ms: 0,
            victim: None,
        }
    }

    fn citizen(&self, id: i32) -> Option<&DemoCitizen> {
        self.citizens.iter().find(|c| c.id == id)
    }

    /// A random citizen who is alive and conscious, other than `except`.
    fn pick_available(&mut self, except: Option<i32>) -> Option<i32> {
        let candidates: Vec<i32> = self
            .citizens
            .iter()
            .filter(|c| c.is_available() && Some(c.id) != except)
            .map(|c| c.id)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates
            .get(self.rng.random_range(0..candidates.len()))
            .copied()
    }

    fn pick_victim(&mut self, murderer: Option<i32>, events: &mut Vec<SimEvent>) {
        self.victim = self.pick_available(murderer);
        if let Some(id) = self.victim {
            events.push(SimEvent::VictimPicked { id });
        }
    }

    fn open_case(&mut self, events: &mut Vec<SimEvent>) {
        let murderer = self.pick_available(None);
        if let Some(id) = murderer {
            events.push(SimEvent::MurdererPicked { id });
        }
        self.pick_victim(murderer, events);
        info!(?murderer, victim = ?self.victim, "Case opened");
    }

    /// Minutes on the game clock since midnight of day one.
    #[allow(clippy::arithmetic_side_effects)]
    fn game_minutes(&self) -> u64 {
        START_MINUTES.saturating_add(self.elapsed_ms / 1000)
    }

    // Float math on bounded health and timer values.
    #[allow(clippy::arithmetic_side_effects)]
    fn tick_knockouts(&mut self, seconds: f32, events: &mut Vec<SimEvent>) {
        for citizen in &mut self.citizens {
            let Some(remaining) = citizen.knockout else {
                continue;
            };
            let remaining = (remaining - seconds).max(0.0);
            if remaining > 0.0 {
                citizen.knockout = Some(remaining);
                events.push(SimEvent::KnockoutTick {
                    id: citizen.id,
                    remaining_seconds: remaining,
                });
            } else {
                citizen.knockout = None;
                citizen.hp = citizen.max_hp * 0.25;
                events.push(SimEvent::Recovered { id: citizen.id });
                events.push(SimEvent::HealthChanged {
                    id: citizen.id,
                    current: citizen.hp,
                    max: citizen.max_hp,
                });
            }
        }
    }

    #[allow(clippy::arithmetic_side_effects)]
    fn incident(&mut self, events: &mut Vec<SimEvent>) {
        let Some(id) = self.pick_available(None) else {
            return;
        };
        let damage: f32 = self.rng.random_range(10.0..40.0);
        let is_victim = self.victim == Some(id);
        let Some(citizen) = self.citizens.iter_mut().find(|c| c.id == id) else {
            return;
        };
        citizen.hp = (citizen.hp - damage).max(0.0);
        events.push(SimEvent::HealthChanged {
            id,
            current: citizen.hp,
            max: citizen.max_hp,
        });
        if citizen.hp > 0.0 {
            debug!(id, damage, "Citizen hurt");
            return;
        }
        if is_victim {
            citizen.dead = true;
            let name = citizen.full_name();
            info!(id, name = %name, "Victim killed");
            events.push(SimEvent::Died {
                id,
                name: Some(name),
            });
            let murderer = self.pick_available(None);
            self.pick_victim(murderer, events);
        } else {
            citizen.knockout = Some(KNOCKOUT_SECONDS);
            events.push(SimEvent::KnockedOut {
                id,
                total_seconds: KNOCKOUT_SECONDS,
                remaining_seconds: KNOCKOUT_SECONDS,
            });
        }
    }
}

fn workplaces(rng: &mut StdRng) -> Vec<DemoAddress> {
    let mut id = FIRST_ADDRESS_ID;
    let mut list = Vec::with_capacity(WORKPLACES.len());
    for &(name, building) in WORKPLACES {
        list.push(DemoAddress {
            id,
            details: AddressDetails {
                name: name.to_owned(),
                building_name: building.to_owned(),
                floor: String::from("Ground"),
                floor_number: Some(0),
                address_preset: String::from("Workplace"),
                is_residence: false,
                design_style: pick(rng, DESIGN_STYLES).to_owned(),
                room_count: rng.random_range(2..8),
            },
            inhabitants: Vec::new(),
        });
        id = id.saturating_add(1);
    }
    list
}

fn residence(rng: &mut StdRng, id: i32, number: u32) -> DemoAddress {
    let street = pick(rng, STREETS);
    let floor: i32 = rng.random_range(0..3);
    DemoAddress {
        id,
        details: AddressDetails {
            name: format!("{number} {street}"),
            building_name: format!("{street} Block"),
            floor: MAP_LAYERS
                .iter()
                .find(|(_, ordinal)| *ordinal == floor)
                .map_or_else(String::new, |(name, _)| (*name).to_owned()),
            floor_number: Some(floor),
            address_preset: String::from("Apartment"),
            is_residence: true,
            design_style: pick(rng, DESIGN_STYLES).to_owned(),
            room_count: rng.random_range(1..5),
        },
        inhabitants: Vec::new(),
    }
}

fn citizen(
    rng: &mut StdRng,
    id: i32,
    addresses: &[DemoAddress],
    home_index: usize,
    work_index: Option<usize>,
) -> DemoCitizen {
    let identity = Identity {
        name: pick(rng, GIVEN_NAMES).to_owned(),
        surname: pick(rng, SURNAMES).to_owned(),
    };
    let home = addresses.get(home_index).map_or_else(Home::default, |a| Home {
        address: a.details.name.clone(),
        address_id: Some(a.id),
        building: a.details.building_name.clone(),
        floor: a.details.floor.clone(),
        telephone: format!("{:03}-{:04}", rng.random_range(100..1000), rng.random_range(0..10_000)),
    });
    let employment = work_index
        .and_then(|i| addresses.get(i))
        .map_or_else(Employment::default, |a| Employment {
            employer: a.details.name.clone(),
            job_title: pick(rng, JOB_TITLES).to_owned(),
            salary: format!("Cr. {}", rng.random_range(12_u32..60).saturating_mul(1000)),
            work_address_id: Some(a.id),
            works_in_building: a.details.building_name.clone(),
            work_hours: String::from("09:00 - 17:00"),
        });
    let age_years: i32 = rng.random_range(18..80);
    let height_cm: f32 = rng.random_range(150.0..200.0);
    let profile = Profile {
        age_years,
        age_group: String::from(if age_years < 30 {
            "Young Adult"
        } else if age_years < 55 {
            "Adult"
        } else {
            "Senior"
        }),
        gender: pick(rng, GENDERS).to_owned(),
        height_cm,
        height_category: String::from(if height_cm < 165.0 {
            "Short"
        } else if height_cm < 185.0 {
            "Average"
        } else {
            "Tall"
        }),
        build: pick(rng, BUILDS).to_owned(),
        hair_type: pick(rng, HAIR_TYPES).to_owned(),
        hair_color: pick(rng, HAIR_COLORS).to_owned(),
        eyes: pick(rng, EYES).to_owned(),
        shoe_size: rng.random_range(36..47),
        date_of_birth: format!(
            "{}/{}/{}",
            rng.random_range(1..29),
            rng.random_range(1..13),
            1979_i32.saturating_sub(age_years)
        ),
        handwriting: pick(rng, HANDWRITING).to_owned(),
    };
    let mut traits = Vec::new();
    if rng.random_bool(0.15) {
        traits.push(String::from("Affliction-ShortSighted"));
    }
    if rng.random_bool(0.25) {
        traits.push(String::from("Quirk-FacialHair"));
    }
    DemoCitizen {
        id,
        identity,
        hp: 100.0,
        max_hp: 100.0,
        dead: false,
        knockout: None,
        employment,
        home,
        profile,
        traits,
    }
}

fn inhabitant(citizen: &DemoCitizen) -> Inhabitant {
    let employment = &citizen.employment;
    Inhabitant {
        id: citizen.id,
        name: citizen.identity.name.clone(),
        surname: citizen.identity.surname.clone(),
        photo_png: None,
        job_title: employment.work_address_id.map(|_| employment.job_title.clone()),
        employer_address_id: employment.work_address_id,
    }
}

impl Simulation for DemoCity {
    fn citizens(&self) -> Vec<&dyn CitizenView> {
        self.citizens.iter().map(|c| c as &dyn CitizenView).collect()
    }

    fn addresses(&self) -> Vec<&dyn AddressView> {
        self.addresses.iter().map(|a| a as &dyn AddressView).collect()
    }

    fn session_info(&self) -> Result<SessionInfo, ExtractError> {
        Ok(SessionInfo {
            save_name: format!("demo-{}.sod", self.seed),
            murder_mo: self.murder_mo.to_owned(),
            city_name: String::from("Quay City"),
        })
    }

    #[allow(clippy::arithmetic_side_effects)]
    fn time_text(&self) -> Result<String, ExtractError> {
        let minutes = self.game_minutes();
        let hour = (minutes / 60) % 24;
        let minute = minutes % 60;
        Ok(format!("{hour:02}:{minute:02}"))
    }

    // Hours fit comfortably in an f32 for any realistic uptime.
    #[allow(clippy::cast_precision_loss, clippy::arithmetic_side_effects)]
    fn game_date(&self) -> Result<GameDate, ExtractError> {
        let minutes = self.game_minutes();
        let days = i32::try_from(minutes / (24 * 60)).unwrap_or(i32::MAX);
        Ok(GameDate {
            game_time: minutes as f32 / 60.0,
            month: 3,
            day: days.saturating_add(14).min(31),
            year: 1979,
        })
    }

    fn player_vitals(&self) -> Option<PlayerVitals> {
        self.loaded.then_some(self.player)
    }

    fn spawnable_presets(&self) -> Vec<String> {
        PRESETS.iter().map(|&p| p.to_owned()).collect()
    }

    fn spawn_into_inventory(&mut self, preset: &str) -> Result<(), ActionError> {
        if !PRESETS.contains(&preset) {
            return Err(ActionError::PresetNotFound(preset.to_owned()));
        }
        self.inventory.push(preset.to_owned());
        info!(preset, items = self.inventory.len(), "Item spawned");
        Ok(())
    }

    fn spawn_default_inventory(&mut self) -> Result<(), ActionError> {
        self.inventory
            .extend(DEFAULT_INVENTORY.iter().map(|&p| p.to_owned()));
        info!(items = self.inventory.len(), "Default inventory spawned");
        Ok(())
    }

    fn teleport_player_to(&mut self, npc_id: i32) -> Result<String, ActionError> {
        let name = self
            .citizen(npc_id)
            .map(DemoCitizen::full_name)
            .ok_or(ActionError::NpcNotFound)?;
        info!(npc_id, name = %name, "Player teleported");
        Ok(name)
    }

    fn teleport_npc_to_player(&mut self, npc_id: i32) -> Result<(), ActionError> {
        let citizen = self.citizen(npc_id).ok_or(ActionError::NpcNotFound)?;
        if citizen.dead {
            return Err(ActionError::Failed(String::from("Cannot move a dead citizen")));
        }
        info!(npc_id, "Citizen teleported to player");
        Ok(())
    }

    fn capture_map(
        &mut self,
        ordinal: i32,
        width: u32,
        height: u32,
        include_buildings: bool,
    ) -> Option<Vec<u8>> {
        let known = ordinal == -1 || MAP_LAYERS.iter().any(|(_, o)| *o == ordinal);
        if !known {
            return None;
        }
        debug!(ordinal, width, height, include_buildings, "Map captured");
        Some(PLACEHOLDER_PNG.to_vec())
    }

    fn map_layers(&self) -> Option<(Vec<MapLayer>, i32)> {
        let layers = MAP_LAYERS
            .iter()
            .enumerate()
            .map(|(i, &(name, ordinal))| MapLayer {
                index: i32::try_from(i).unwrap_or(i32::MAX),
                ordinal,
                name: name.to_owned(),
                active_self: i == self.active_layer,
                active_in_hierarchy: i == self.active_layer,
                child_count: 0,
            })
            .collect();
        let active = MAP_LAYERS.get(self.active_layer).map_or(0, |&(_, o)| o);
        Some((layers, active))
    }

    fn activate_map_layer(&mut self, index: i32) -> Option<i32> {
        let slot = usize::try_from(index).ok().filter(|&i| i < MAP_LAYERS.len())?;
        self.active_layer = slot;
        Some(index)
    }

    fn step(&mut self, dt: Duration) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if !self.loaded {
            self.loaded = true;
            events.push(SimEvent::WorldLoaded);
            self.open_case(&mut events);
            return events;
        }
        let elapsed = u64::try_from(dt.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed);
        self.tick_knockouts(dt.as_secs_f32(), &mut events);
        if self.rng.random_bool(INCIDENT_CHANCE) {
            self.incident(&mut events);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn city(seed: u64) -> DemoCity {
        DemoCity::generate(&SimulationConfig {
            tick_interval_ms: 10,
            citizen_count: 30,
            seed,
        })
    }

    fn names(city: &DemoCity) -> Vec<String> {
        city.citizens.iter().map(DemoCitizen::full_name).collect()
    }

    #[test]
    fn same_seed_same_city() {
        assert_eq!(names(&city(7)), names(&city(7)));
        assert_eq!(city(7).addresses.len(), WORKPLACES.len() + 10);
    }

    #[test]
    fn first_step_loads_world_and_opens_case() {
        let mut city = city(3);
        assert!(city.player_vitals().is_none());
        let events = city.step(Duration::from_millis(50));
        assert_eq!(events[0], SimEvent::WorldLoaded);
        assert!(events.iter().any(|e| matches!(e, SimEvent::MurdererPicked { .. })));
        assert!(events.iter().any(|e| matches!(e, SimEvent::VictimPicked { .. })));
        assert!(city.player_vitals().is_some());
    }

    #[test]
    fn every_citizen_lives_somewhere() {
        let city = city(11);
        for citizen in &city.citizens {
            let home_id = citizen.home.address_id.unwrap();
            let home = city.addresses.iter().find(|a| a.id == home_id).unwrap();
            assert!(home.details.is_residence);
            assert!(home.inhabitants.iter().any(|i| i.id == citizen.id));
        }
    }

    #[test]
    fn knockouts_count_down_and_recover() {
        let mut city = city(5);
        city.step(Duration::ZERO);
        city.citizens[0].knockout = Some(1.0);
        let mut events = Vec::new();
        city.tick_knockouts(0.5, &mut events);
        assert!(matches!(events[0], SimEvent::KnockoutTick { id: 1, .. }));
        events.clear();
        city.tick_knockouts(0.6, &mut events);
        assert_eq!(events[0], SimEvent::Recovered { id: 1 });
        assert!(city.citizens[0].knockout.is_none());
    }

    #[test]
    fn clock_advances_with_steps() {
        let mut city = city(1);
        city.step(Duration::ZERO);
        assert_eq!(city.time_text().unwrap(), "08:00");
        city.step(Duration::from_secs(90));
        assert_eq!(city.time_text().unwrap(), "09:30");
    }

    #[test]
    fn actions_validate_targets() {
        let mut city = city(2);
        assert_eq!(city.teleport_player_to(9999), Err(ActionError::NpcNotFound));
        assert!(city.teleport_player_to(1).is_ok());
        city.spawn_into_inventory("Apple").unwrap();
        city.spawn_default_inventory().unwrap();
        assert_eq!(city.inventory.len(), 1 + DEFAULT_INVENTORY.len());
        assert_eq!(city.activate_map_layer(9), None);
        assert_eq!(city.activate_map_layer(0), Some(0));
        let (_, active) = city.map_layers().unwrap();
        assert_eq!(active, -1);
        assert!(city.capture_map(7, 64, 64, false).is_none());
        assert!(city.capture_map(-1, 64, 64, true).unwrap().starts_with(&[0x89, b'P']));
    }
}
