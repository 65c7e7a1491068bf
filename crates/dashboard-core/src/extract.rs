//! Best-effort conversion of simulation views into cache records.
//!
//! A view whose id cannot be read yields an error and the caller skips
//! it. Any other field group that fails is logged and left at its
//! default, so one corrupt descriptor never costs the whole record.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use dashboard_types::{AddressRecord, NO_ID, NpcRecord, ResidentRecord};
use tracing::warn;

use crate::simulation::{AddressView, CitizenView, ExtractError, Inhabitant};

/// Trait names that mean the citizen wears glasses.
const GLASSES_TRAITS: [&str; 2] = ["Affliction-ShortSighted", "Affliction-FarSighted"];

/// Trait name that means the citizen has facial hair.
const FACIAL_HAIR_TRAIT: &str = "Quirk-FacialHair";

/// Encode PNG bytes as a `data:` URL.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png))
}

fn photo_url(png: Option<&[u8]>) -> String {
    match png {
        Some(bytes) if !bytes.is_empty() => png_data_url(bytes),
        _ => String::new(),
    }
}

/// Unwrap a field group, logging and returning `None` on failure.
fn field<T>(entity: &'static str, id: i32, result: Result<T, ExtractError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(entity, id, error = %e, "Defaulting unreadable field group");
            None
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i32(value: f32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    // Clamped into range first, so the cast cannot wrap.
    f64::from(value)
        .round()
        .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Build an [`NpcRecord`] from a citizen view.
///
/// # Errors
///
/// Returns the id read error; every other failure is defaulted.
pub fn extract_npc(view: &dyn CitizenView) -> Result<NpcRecord, ExtractError> {
    let id = view.id()?;
    let mut record = NpcRecord::blank(id);

    if let Some(identity) = field("citizen", id, view.identity()) {
        record.name = identity.name;
        record.surname = identity.surname;
    }
    if let Some(photo) = field("citizen", id, view.photo_png()) {
        record.photo = photo_url(photo.as_deref());
    }
    if let Some(vitals) = field("citizen", id, view.vitals()) {
        record.hp_current = vitals.current;
        record.hp_max = vitals.max;
        record.is_dead = vitals.is_dead;
    }
    if let Some(job) = field("citizen", id, view.employment()) {
        record.employer = job.employer;
        record.job_title = job.job_title;
        record.salary = job.salary;
        record.work_address_id = job.work_address_id.unwrap_or(NO_ID);
        record.works_in_building = job.works_in_building;
        record.work_hours = job.work_hours;
    }
    if let Some(home) = field("citizen", id, view.home()) {
        record.home_address = home.address;
        record.home_address_id = home.address_id.unwrap_or(NO_ID);
        record.lives_in_building = home.building;
        record.lives_on_floor = home.floor;
        record.telephone_number = home.telephone;
    }
    if let Some(profile) = field("citizen", id, view.profile()) {
        record.age_years = profile.age_years;
        record.age_group = profile.age_group;
        record.gender = profile.gender;
        record.height_cm = round_to_i32(profile.height_cm);
        record.height_category = profile.height_category;
        record.build = profile.build;
        record.hair_type = profile.hair_type;
        record.hair_color = profile.hair_color;
        record.eyes = profile.eyes;
        record.shoe_size = profile.shoe_size;
        record.date_of_birth = profile.date_of_birth;
        record.handwriting = profile.handwriting;
    }
    if let Some(traits) = field("citizen", id, view.traits()) {
        record.glasses = traits.iter().any(|t| GLASSES_TRAITS.contains(&t.as_str()));
        record.facial_hair = traits.iter().any(|t| t == FACIAL_HAIR_TRAIT);
    }

    Ok(record)
}

fn resident(address_id: i32, is_residence: bool, inhabitant: Inhabitant) -> ResidentRecord {
    let works_here = !is_residence && inhabitant.employer_address_id == Some(address_id);
    let job_title = if works_here {
        inhabitant.job_title.unwrap_or_default()
    } else {
        String::new()
    };
    ResidentRecord {
        id: inhabitant.id,
        name: inhabitant.name,
        surname: inhabitant.surname,
        photo: photo_url(inhabitant.photo_png.as_deref()),
        job_title,
    }
}

/// Build an [`AddressRecord`] from an address view.
///
/// A resident's job title is filled in only for non-residential
/// addresses that are that resident's workplace.
///
/// # Errors
///
/// Returns the id read error; every other failure is defaulted.
pub fn extract_address(view: &dyn AddressView) -> Result<AddressRecord, ExtractError> {
    let id = view.id()?;
    let mut record = AddressRecord::blank(id);

    if let Some(details) = field("address", id, view.details()) {
        record.name = details.name;
        record.building_name = details.building_name;
        record.floor = details.floor;
        record.floor_number = details.floor_number.unwrap_or(NO_ID);
        record.address_preset = details.address_preset;
        record.is_residence = details.is_residence;
        record.design_style = details.design_style;
        record.room_count = details.room_count;
    }
    if let Some(inhabitants) = field("address", id, view.inhabitants()) {
        let is_residence = record.is_residence;
        record.residents = inhabitants
            .into_iter()
            .map(|i| resident(id, is_residence, i))
            .collect();
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::simulation::{AddressDetails, Employment, Home, Identity, Profile, Vitals};

    struct Citizen {
        id: Result<i32, ExtractError>,
        broken_profile: bool,
        traits: Vec<String>,
    }

    impl CitizenView for Citizen {
        fn id(&self) -> Result<i32, ExtractError> {
            self.id.clone()
        }
        fn identity(&self) -> Result<Identity, ExtractError> {
            Ok(Identity {
                name: String::from("Mira"),
                surname: String::from("Holt"),
            })
        }
        fn photo_png(&self) -> Result<Option<Vec<u8>>, ExtractError> {
            Ok(Some(vec![1, 2, 3]))
        }
        fn vitals(&self) -> Result<Vitals, ExtractError> {
            Ok(Vitals {
                current: 40.0,
                max: 100.0,
                is_dead: false,
            })
        }
        fn employment(&self) -> Result<Employment, ExtractError> {
            Err(ExtractError::new("employment", "job preset missing"))
        }
        fn home(&self) -> Result<Home, ExtractError> {
            Ok(Home {
                address: String::from("Flat 3"),
                address_id: Some(12),
                ..Home::default()
            })
        }
        fn profile(&self) -> Result<Profile, ExtractError> {
            if self.broken_profile {
                return Err(ExtractError::new("profile", "descriptors missing"));
            }
            Ok(Profile {
                height_cm: 171.6,
                ..Profile::default()
            })
        }
        fn traits(&self) -> Result<Vec<String>, ExtractError> {
            Ok(self.traits.clone())
        }
    }

    #[test]
    fn failed_groups_are_defaulted() {
        let citizen = Citizen {
            id: Ok(5),
            broken_profile: true,
            traits: vec![String::from("Quirk-FacialHair")],
        };
        let record = extract_npc(&citizen).unwrap();
        assert_eq!(record.id, 5);
        assert_eq!(record.name, "Mira");
        assert_eq!(record.employer, "");
        assert_eq!(record.work_address_id, NO_ID);
        assert_eq!(record.home_address_id, 12);
        assert_eq!(record.height_cm, 0);
        assert!(record.facial_hair);
        assert!(!record.glasses);
        assert!(record.photo.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn height_is_rounded_and_glasses_detected() {
        let citizen = Citizen {
            id: Ok(6),
            broken_profile: false,
            traits: vec![String::from("Affliction-FarSighted")],
        };
        let record = extract_npc(&citizen).unwrap();
        assert_eq!(record.height_cm, 172);
        assert!(record.glasses);
    }

    #[test]
    fn unreadable_id_is_an_error() {
        let citizen = Citizen {
            id: Err(ExtractError::new("id", "destroyed")),
            broken_profile: false,
            traits: Vec::new(),
        };
        assert!(extract_npc(&citizen).is_err());
    }

    struct Office {
        residence: bool,
    }

    impl AddressView for Office {
        fn id(&self) -> Result<i32, ExtractError> {
            Ok(40)
        }
        fn details(&self) -> Result<AddressDetails, ExtractError> {
            Ok(AddressDetails {
                name: String::from("Kessler & Sons"),
                is_residence: self.residence,
                ..AddressDetails::default()
            })
        }
        fn inhabitants(&self) -> Result<Vec<Inhabitant>, ExtractError> {
            Ok(vec![
                Inhabitant {
                    id: 1,
                    name: String::from("Works"),
                    job_title: Some(String::from("Clerk")),
                    employer_address_id: Some(40),
                    ..Inhabitant::default()
                },
                Inhabitant {
                    id: 2,
                    name: String::from("Elsewhere"),
                    job_title: Some(String::from("Cook")),
                    employer_address_id: Some(41),
                    ..Inhabitant::default()
                },
            ])
        }
    }

    #[test]
    fn job_title_only_for_own_workplace() {
        let record = extract_address(&Office { residence: false }).unwrap();
        assert_eq!(record.floor_number, NO_ID);
        let titles: Vec<&str> = record.residents.iter().map(|r| r.job_title.as_str()).collect();
        assert_eq!(titles, vec!["Clerk", ""]);
    }

    #[test]
    fn residences_never_carry_job_titles() {
        let record = extract_address(&Office { residence: true }).unwrap();
        assert!(record.residents.iter().all(|r| r.job_title.is_empty()));
    }

    #[test]
    fn data_url_prefix() {
        assert_eq!(png_data_url(&[0, 0]), "data:image/png;base64,AAA=");
    }
}
