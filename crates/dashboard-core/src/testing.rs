//! Scripted simulation for unit tests.

use std::collections::VecDeque;
use std::time::Duration;

use dashboard_types::{MapLayer, PlayerVitals};

use crate::simulation::{
    ActionError, AddressDetails, AddressView, CitizenView, Employment, ExtractError, GameDate,
    Home, Identity, Inhabitant, Profile, SessionInfo, SimEvent, Simulation, Vitals,
};

pub struct FakeCitizen {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub corrupt: bool,
}

impl CitizenView for FakeCitizen {
    fn id(&self) -> Result<i32, ExtractError> {
        if self.corrupt {
            return Err(ExtractError::new("id", "object destroyed"));
        }
        Ok(self.id)
    }
    fn identity(&self) -> Result<Identity, ExtractError> {
        Ok(Identity {
            name: self.name.clone(),
            surname: self.surname.clone(),
        })
    }
    fn photo_png(&self) -> Result<Option<Vec<u8>>, ExtractError> {
        Ok(None)
    }
    fn vitals(&self) -> Result<Vitals, ExtractError> {
        Ok(Vitals {
            current: 100.0,
            max: 100.0,
            is_dead: false,
        })
    }
    fn employment(&self) -> Result<Employment, ExtractError> {
        Ok(Employment::default())
    }
    fn home(&self) -> Result<Home, ExtractError> {
        Ok(Home::default())
    }
    fn profile(&self) -> Result<Profile, ExtractError> {
        Ok(Profile::default())
    }
    fn traits(&self) -> Result<Vec<String>, ExtractError> {
        Ok(Vec::new())
    }
}

pub struct FakeAddress {
    pub id: i32,
    pub name: String,
}

impl AddressView for FakeAddress {
    fn id(&self) -> Result<i32, ExtractError> {
        Ok(self.id)
    }
    fn details(&self) -> Result<AddressDetails, ExtractError> {
        Ok(AddressDetails {
            name: self.name.clone(),
            is_residence: true,
            ..AddressDetails::default()
        })
    }
    fn inhabitants(&self) -> Result<Vec<Inhabitant>, ExtractError> {
        Ok(Vec::new())
    }
}

pub struct ScriptedSim {
    pub citizens: Vec<FakeCitizen>,
    pub addresses: Vec<FakeAddress>,
    pub player: Option<PlayerVitals>,
    pub presets: Vec<String>,
    pub spawned: Vec<String>,
    pub map_png: Option<Vec<u8>>,
    pub script: VecDeque<Vec<SimEvent>>,
    pub steps: u32,
}

impl Default for ScriptedSim {
    fn default() -> Self {
        Self {
            citizens: Vec::new(),
            addresses: Vec::new(),
            player: Some(PlayerVitals::default()),
            presets: vec![
                String::from("crowbar"),
                String::from("apple"),
                String::from("Baguette"),
            ],
            spawned: Vec::new(),
            map_png: Some(vec![0x89, b'P', b'N', b'G']),
            script: VecDeque::new(),
            steps: 0,
        }
    }
}

impl ScriptedSim {
    pub fn with_citizens(people: &[(i32, &str, &str)]) -> Self {
        Self {
            citizens: people
                .iter()
                .map(|(id, name, surname)| FakeCitizen {
                    id: *id,
                    name: (*name).to_owned(),
                    surname: (*surname).to_owned(),
                    corrupt: false,
                })
                .collect(),
            ..Self::default()
        }
    }

    fn citizen(&self, id: i32) -> Option<&FakeCitizen> {
        self.citizens.iter().find(|c| c.id == id && !c.corrupt)
    }
}

impl Simulation for ScriptedSim {
    fn citizens(&self) -> Vec<&dyn CitizenView> {
        self.citizens.iter().map(|c| c as &dyn CitizenView).collect()
    }
    fn addresses(&self) -> Vec<&dyn AddressView> {
        self.addresses.iter().map(|a| a as &dyn AddressView).collect()
    }
    fn session_info(&self) -> Result<SessionInfo, ExtractError> {
        Ok(SessionInfo {
            save_name: String::from("quay.sod"),
            murder_mo: String::from("Strangler"),
            city_name: String::from("Quay"),
        })
    }
    fn time_text(&self) -> Result<String, ExtractError> {
        Ok(format!("tick {}", self.steps))
    }
    fn game_date(&self) -> Result<GameDate, ExtractError> {
        Ok(GameDate {
            game_time: 1.5,
            month: 3,
            day: 14,
            year: 1979,
        })
    }
    fn player_vitals(&self) -> Option<PlayerVitals> {
        self.player
    }
    fn spawnable_presets(&self) -> Vec<String> {
        self.presets.clone()
    }
    fn spawn_into_inventory(&mut self, preset: &str) -> Result<(), ActionError> {
        self.spawned.push(preset.to_owned());
        Ok(())
    }
    fn spawn_default_inventory(&mut self) -> Result<(), ActionError> {
        self.spawned.push(String::from("<default>"));
        Ok(())
    }
    fn teleport_player_to(&mut self, npc_id: i32) -> Result<String, ActionError> {
        self.citizen(npc_id)
            .map(|c| format!("{} {}", c.name, c.surname))
            .ok_or(ActionError::NpcNotFound)
    }
    fn teleport_npc_to_player(&mut self, npc_id: i32) -> Result<(), ActionError> {
        self.citizen(npc_id).map(|_| ()).ok_or(ActionError::NpcNotFound)
    }
    fn capture_map(&mut self, _ordinal: i32, _w: u32, _h: u32, _b: bool) -> Option<Vec<u8>> {
        self.map_png.clone()
    }
    fn map_layers(&self) -> Option<(Vec<MapLayer>, i32)> {
        None
    }
    fn activate_map_layer(&mut self, _index: i32) -> Option<i32> {
        None
    }
    fn step(&mut self, _dt: Duration) -> Vec<SimEvent> {
        self.steps = self.steps.saturating_add(1);
        self.script.pop_front().unwrap_or_default()
    }
}
