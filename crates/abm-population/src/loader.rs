//! CSV population loader.
//!
//! # `places.csv`
//!
//! ```csv
//! place_id,kind,capacity,contact_intensity,dwell_days
//! 0,household,4,,
//! 1,workplace,40,0.3,0.33
//! 2,leisure,25,,
//! ```
//!
//! `contact_intensity` and `dwell_days` override the kind defaults from the
//! parameter set; both must be given or both left empty.
//!
//! # `agents.csv`
//!
//! ```csv
//! agent_id,kind,age,household,school,work,hospital,transit,works_from_home,susceptibility,health,role,testing,vaccination
//! 0,regular,34,0,,1,,,false,,,,,
//! 1,hospital_employee,51,0,,,3,,false,,,,,
//! 2,hospital_patient,80,,,,3,,false,,,,,
//! ```
//!
//! Empty cells are `None`.  The four trailing columns name an initial state
//! per category; empty means the category's configured initial value.
//! Ids in both files must run `0..n` in file order.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use abm_core::{Category, PlaceId};

use crate::{
    AgentKind, AgentRecord, InitialStates, Place, PlaceKind, PopulationError, PopulationResult,
    TransmissionParams,
};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PlaceRecord {
    place_id:          u32,
    kind:              PlaceKind,
    capacity:          u32,
    contact_intensity: Option<f64>,
    dwell_days:        Option<f64>,
}

#[derive(Deserialize)]
struct AgentCsvRecord {
    agent_id:        u32,
    kind:            AgentKind,
    age:             u8,
    household:       Option<u32>,
    school:          Option<u32>,
    work:            Option<u32>,
    hospital:        Option<u32>,
    transit:         Option<u32>,
    #[serde(default)]
    works_from_home: Option<bool>,
    #[serde(default)]
    susceptibility:  Option<f64>,
    #[serde(default)]
    health:          Option<String>,
    #[serde(default)]
    role:            Option<String>,
    #[serde(default)]
    testing:         Option<String>,
    #[serde(default)]
    vaccination:     Option<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load places from a CSV file.
pub fn load_places_csv(path: &Path) -> PopulationResult<Vec<Place>> {
    let file = std::fs::File::open(path)?;
    load_places_reader(file)
}

/// Like [`load_places_csv`] but accepts any `Read` source.
pub fn load_places_reader<R: Read>(reader: R) -> PopulationResult<Vec<Place>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut places = Vec::new();

    for (row, result) in csv_reader.deserialize::<PlaceRecord>().enumerate() {
        let r = result.map_err(|e| PopulationError::Parse(e.to_string()))?;
        if r.place_id as usize != row {
            return Err(PopulationError::PlaceOrder { row, id: r.place_id });
        }
        let transmission = match (r.contact_intensity, r.dwell_days) {
            (Some(contact_intensity), Some(dwell_days)) => {
                Some(TransmissionParams { contact_intensity, dwell_days })
            }
            (None, None) => None,
            _ => {
                return Err(PopulationError::Parse(format!(
                    "place {}: contact_intensity and dwell_days must be given together",
                    r.place_id
                )));
            }
        };
        places.push(Place {
            id: PlaceId(r.place_id),
            kind: r.kind,
            capacity: r.capacity,
            transmission,
        });
    }

    Ok(places)
}

/// Load agent records from a CSV file.
pub fn load_agents_csv(path: &Path) -> PopulationResult<Vec<AgentRecord>> {
    let file = std::fs::File::open(path)?;
    load_agents_reader(file)
}

/// Like [`load_agents_csv`] but accepts any `Read` source.
pub fn load_agents_reader<R: Read>(reader: R) -> PopulationResult<Vec<AgentRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut agents = Vec::new();

    for (row, result) in csv_reader.deserialize::<AgentCsvRecord>().enumerate() {
        let r = result.map_err(|e| PopulationError::Parse(e.to_string()))?;
        if r.agent_id as usize != row {
            return Err(PopulationError::AgentOrder { row, id: r.agent_id });
        }

        let mut initial = InitialStates::default();
        for (category, name) in [
            (Category::Health, r.health),
            (Category::Role, r.role),
            (Category::Testing, r.testing),
            (Category::Vaccination, r.vaccination),
        ] {
            initial.names[category.index()] = name.filter(|n| !n.trim().is_empty());
        }

        agents.push(AgentRecord {
            kind:            r.kind,
            age:             r.age,
            household:       r.household,
            school:          r.school,
            work:            r.work,
            hospital:        r.hospital,
            transit:         r.transit,
            works_from_home: r.works_from_home.unwrap_or(false),
            susceptibility:  r.susceptibility,
            initial,
        });
    }

    Ok(agents)
}
