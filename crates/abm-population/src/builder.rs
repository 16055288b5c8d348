//! Validating builder for a [`Population`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let places = load_places_csv(Path::new("places.csv"))?;
//! let agents = load_agents_csv(Path::new("agents.csv"))?;
//! let population = PopulationBuilder::new(/*seed=*/ 42)
//!     .places(places)
//!     .agents(agents)
//!     .infectiousness_variability(Some(2.0))
//!     .build()?;
//! ```
//!
//! Every check here is a configuration-integrity check: a population that
//! fails one cannot be simulated.

use rand_distr::Gamma;

use abm_core::{AgentId, PlaceId};

use crate::{
    AgentKind, AgentRecord, AgentRngs, AgentStore, InitialStates, Place, PlaceKind, PlaceStore,
    PopulationError, PopulationResult,
};

/// A validated population: attributes, per-agent RNGs, places and the
/// initial state names to resolve against the taxonomy.
pub struct Population {
    pub agents:  AgentStore,
    pub rngs:    AgentRngs,
    pub places:  PlaceStore,
    pub initial: Vec<InitialStates>,
}

/// Fluent builder for [`Population`].
pub struct PopulationBuilder {
    seed:        u64,
    places:      Vec<Place>,
    agents:      Vec<AgentRecord>,
    variability: Option<f64>,
}

impl PopulationBuilder {
    /// `seed` seeds the per-agent RNGs.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            places:      Vec::new(),
            agents:      Vec::new(),
            variability: None,
        }
    }

    /// Places, ordered by id `0..n`.
    pub fn places(mut self, places: Vec<Place>) -> Self {
        self.places = places;
        self
    }

    /// Agents; the position in the vector is the `AgentId`.
    pub fn agents(mut self, agents: Vec<AgentRecord>) -> Self {
        self.agents = agents;
        self
    }

    /// Shape `k` of a Gamma(k, 1/k) draw (mean 1) applied to each agent's
    /// infectiousness.  `None` gives every agent 1.0.
    pub fn infectiousness_variability(mut self, shape: Option<f64>) -> Self {
        self.variability = shape;
        self
    }

    pub fn build(self) -> PopulationResult<Population> {
        // ── Places ────────────────────────────────────────────────────────
        for (row, p) in self.places.iter().enumerate() {
            if p.id.index() != row {
                return Err(PopulationError::PlaceOrder { row, id: p.id.0 });
            }
        }
        let places = PlaceStore::from_sorted(self.places);

        // ── Agents ────────────────────────────────────────────────────────
        let count = self.agents.len();
        let mut store = AgentStore::new(count);
        let mut rngs = AgentRngs::new(count, self.seed);
        let mut initial = Vec::with_capacity(count);
        let mut assigned = vec![0u32; places.len()];

        for (i, rec) in self.agents.into_iter().enumerate() {
            let agent = AgentId(i as u32);

            let household = resolve(&places, agent, "household", rec.household, PlaceKind::is_residence)?;
            let school    = resolve(&places, agent, "school", rec.school, |k| k == PlaceKind::School)?;
            let work      = resolve(&places, agent, "work", rec.work, |k| {
                matches!(k, PlaceKind::Workplace | PlaceKind::School | PlaceKind::Hospital | PlaceKind::RetirementHome)
            })?;
            let hospital  = resolve(&places, agent, "hospital", rec.hospital, |k| k == PlaceKind::Hospital)?;
            let transit   = resolve(&places, agent, "transit", rec.transit, |k| k == PlaceKind::Transit)?;

            match rec.kind {
                AgentKind::HospitalPatient => {
                    if !hospital.is_valid() {
                        return Err(PopulationError::MissingAssignment { agent, field: "hospital" });
                    }
                }
                AgentKind::HospitalEmployee => {
                    if !household.is_valid() {
                        return Err(PopulationError::MissingAssignment { agent, field: "household" });
                    }
                    if !hospital.is_valid() {
                        return Err(PopulationError::MissingAssignment { agent, field: "hospital" });
                    }
                }
                AgentKind::Regular => {
                    if !household.is_valid() {
                        return Err(PopulationError::MissingAssignment { agent, field: "household" });
                    }
                }
            }

            let susceptibility = rec.susceptibility.unwrap_or(1.0);
            if !susceptibility.is_finite() || susceptibility < 0.0 {
                return Err(PopulationError::Config(format!(
                    "{agent}: susceptibility {susceptibility} must be a non-negative number"
                )));
            }

            store.kind[i]            = rec.kind;
            store.age[i]             = rec.age;
            store.household[i]       = household;
            store.school[i]          = school;
            store.work[i]            = work;
            store.hospital[i]        = hospital;
            store.transit[i]         = transit;
            store.works_from_home[i] = rec.works_from_home;
            store.susceptibility[i]  = susceptibility;

            // Distinct places this agent occupies by assignment.
            let mut own: Vec<PlaceId> = vec![store.home(agent), school, transit];
            if !rec.works_from_home {
                own.push(work);
            }
            if rec.kind == AgentKind::HospitalEmployee {
                own.push(hospital);
            }
            own.retain(|p| p.is_valid());
            own.sort_unstable();
            own.dedup();
            for p in own {
                assigned[p.index()] += 1;
            }

            initial.push(rec.initial);
        }

        // ── Capacity by construction ──────────────────────────────────────
        for place in places.iter() {
            let n = assigned[place.id.index()];
            if n > place.capacity {
                return Err(PopulationError::CapacityExceeded {
                    place:    place.id,
                    assigned: n,
                    capacity: place.capacity,
                });
            }
        }

        // ── Infectiousness variability ────────────────────────────────────
        if let Some(shape) = self.variability {
            let gamma = Gamma::new(shape, 1.0 / shape).map_err(|e| {
                PopulationError::Config(format!("infectiousness variability shape {shape}: {e}"))
            })?;
            for (i, rng) in rngs.inner.iter_mut().enumerate() {
                store.variability[i] = rng.sample(&gamma);
            }
        }

        log::info!("population built: {} agents, {} places", store.count, places.len());

        Ok(Population { agents: store, rngs, places, initial })
    }
}

/// Check an optional place reference against the arena and a kind predicate.
fn resolve(
    places: &PlaceStore,
    agent:  AgentId,
    field:  &'static str,
    raw:    Option<u32>,
    ok:     impl Fn(PlaceKind) -> bool,
) -> PopulationResult<PlaceId> {
    let Some(raw) = raw else {
        return Ok(PlaceId::INVALID);
    };
    let id = PlaceId(raw);
    let place = places
        .get(id)
        .ok_or(PopulationError::UnknownPlace { agent, field, place: raw })?;
    if !ok(place.kind) {
        return Err(PopulationError::WrongPlaceKind { agent, field, place: id, kind: place.kind });
    }
    Ok(id)
}
