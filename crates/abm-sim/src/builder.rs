//! Fluent builder for constructing a [`Sim`].

use abm_core::{AgentId, Category, SimRng, Tick};
use abm_infection::InfectionModel;
use abm_interventions::{ContactTracing, Testing, Vaccination, VaccinationCtx};
use abm_mobility::{Mobility, Occupancy};
use abm_population::{AgentRecord, Place, PopulationBuilder};
use abm_states::{StatesManager, Taxonomy, Trait};
use abm_transitions::{SeasonalFlu, TransitionCtx, TransitionsManager};

use crate::sim::Totals;
use crate::{Sim, SimParams, SimResult, Timeline};

/// Child streams of the simulation RNG, one per consumer.
mod stream {
    pub const FLU:         u64 = 1;
    pub const VACCINATION: u64 = 2;
    pub const TRACING:     u64 = 3;
    pub const SEEDING:     u64 = 4;
}

/// Fluent builder for [`Sim`].
///
/// # Example
///
/// ```rust,ignore
/// let params = SimParams::load_json(Path::new("params.json"))?;
/// let mut sim = SimBuilder::new(params)
///     .places(load_places_csv(Path::new("places.csv"))?)
///     .agents(load_agents_csv(Path::new("agents.csv"))?)
///     .build()?;
/// let report = sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    params: SimParams,
    places: Vec<Place>,
    agents: Vec<AgentRecord>,
}

impl SimBuilder {
    pub fn new(params: SimParams) -> Self {
        Self { params, places: Vec::new(), agents: Vec::new() }
    }

    pub fn places(mut self, places: Vec<Place>) -> Self {
        self.places = places;
        self
    }

    pub fn agents(mut self, agents: Vec<AgentRecord>) -> Self {
        self.agents = agents;
        self
    }

    /// Validate everything, wire up the subsystems, schedule every agent's
    /// first transitions, then seed the initial vaccinations and infections
    /// on tick 0.
    pub fn build(self) -> SimResult<Sim> {
        let params = self.params;
        params.validate()?;
        let config = params.simulation.clone();

        #[cfg(feature = "parallel")]
        {
            if let Some(n) = config.num_threads {
                if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
                    log::debug!("keeping the existing Rayon pool: {e}");
                }
            }
        }

        let population = PopulationBuilder::new(config.seed)
            .places(self.places)
            .agents(self.agents)
            .infectiousness_variability(params.infectiousness_variability)
            .build()?;
        let agent_count = population.agents.count;

        let taxonomy = Taxonomy::from_spec(&params.taxonomy)?;
        let states = StatesManager::new(taxonomy, &params.states, &population.agents, &population.initial)?;
        let transitions = TransitionsManager::new(states, &params.transitions, &population.agents)?;

        let mobility = Mobility::new(&params.mobility, &population.places)?;
        let infection = InfectionModel::new(&params.infection, &population.places, transitions.states())?;

        let mut rng = SimRng::new(config.seed);
        let testing = params
            .testing
            .map(|p| Testing::new(p, transitions.states()))
            .transpose()?;
        let vaccination = params
            .vaccination
            .map(|p| Vaccination::new(p, transitions.states(), rng.child(stream::VACCINATION)))
            .transpose()?;
        let tracing = params
            .tracing
            .map(|p| ContactTracing::new(p, transitions.states()))
            .transpose()?;

        let mut sim = Sim {
            clock: config.make_clock(),
            flu: SeasonalFlu::new(params.flu, agent_count),
            occupancy: Occupancy::new(&population.places, agent_count),
            audit: Default::default(),
            flu_rng: rng.child(stream::FLU),
            tracing_rng: rng.child(stream::TRACING),
            totals: Totals::default(),
            ticks_run: 0,
            config,
            agents: population.agents,
            rngs: population.rngs,
            places: population.places,
            transitions,
            mobility,
            infection,
            testing,
            vaccination,
            tracing,
            timeline: Timeline::new(params.events, params.leisure_reopening),
        };

        {
            let mut ctx = TransitionCtx {
                agents: &sim.agents,
                rngs:   &mut sim.rngs,
                clock:  &sim.clock,
                audit:  &mut sim.audit,
            };
            sim.transitions.schedule_all(Tick::ZERO, &mut ctx);
        }
        let vaccinated = seed_vaccinations(&mut sim)?;
        let seeded = seed_infections(&mut sim, params.initial_infections, rng.child(stream::SEEDING));
        sim.totals.infections = sim
            .agents
            .agent_ids()
            .filter(|&a| sim.transitions.states().has_in(a, Category::Health, Trait::Infected))
            .count() as u64;

        log::info!(
            "built simulation: {} agents, {} places, {} seeded infections, {} vaccinated",
            agent_count,
            sim.places.len(),
            seeded,
            vaccinated
        );
        Ok(sim)
    }
}

/// Give the campaign's back-dated initial doses.  Returns how many agents
/// start vaccinated.
fn seed_vaccinations(sim: &mut Sim) -> SimResult<u32> {
    let Some(campaign) = &mut sim.vaccination else { return Ok(0) };
    let mut ctx = VaccinationCtx {
        agents: &mut sim.agents,
        places: &sim.places,
        rngs:   &mut sim.rngs,
        clock:  &sim.clock,
        audit:  &mut sim.audit,
        flu:    &sim.flu,
    };
    let doses = campaign.seed_initial(Tick::ZERO, &mut sim.transitions, &mut ctx)?;
    sim.totals.doses += u64::from(doses);
    Ok(doses)
}

/// Infect `count` susceptible agents chosen by `rng`.  Returns how many were
/// actually infected.
fn seed_infections(sim: &mut Sim, count: u32, mut rng: SimRng) -> usize {
    if count == 0 {
        return 0;
    }
    let states = sim.transitions.states();
    let pool: Vec<AgentId> = sim
        .agents
        .agent_ids()
        .filter(|&a| states.has_in(a, Category::Health, Trait::Susceptible))
        .collect();
    if (count as usize) > pool.len() {
        log::warn!(
            "initial_infections = {count} but only {} agents are susceptible",
            pool.len()
        );
    }
    let mut chosen: Vec<AgentId> = rng
        .sample_indices(pool.len(), (count as usize).min(pool.len()))
        .into_iter()
        .map(|k| pool[k])
        .collect();
    chosen.sort_unstable();

    let to = sim.infection.on_infection();
    let mut ctx = TransitionCtx {
        agents: &sim.agents,
        rngs:   &mut sim.rngs,
        clock:  &sim.clock,
        audit:  &mut sim.audit,
    };
    let mut infected = 0;
    for agent in chosen {
        if sim.transitions.transition(agent, Category::Health, to, Tick::ZERO, &mut ctx).is_some() {
            infected += 1;
        }
    }
    infected
}
