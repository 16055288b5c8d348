//! Exposure per place and infection draws per agent.
//!
//! For each occupied place `j`:
//!
//! ```text
//! λ_j = β_j · Σ_i w_i / n_j^α
//! ```
//!
//! where `w_i` is occupant `i`'s infectiousness (health-state infectiousness
//! × individual variability × vaccine transmission factor, scaled by the
//! kind's `isolation_factor` while isolated), `n_j` the number of occupants
//! and `α` the kind's density exponent.  Kinds with an `outside_lambda`
//! (workplaces and venues out of town) add that constant exposure to every
//! occupied place of the kind, and the kind's current contact scale
//! (closures, lockdown phases) multiplies the sum.  A susceptible agent `k`
//! then gets
//!
//! ```text
//! p_k = 1 − exp(−Δt · s_k · Σ_j λ_j · dwell_j)
//! ```
//!
//! over the places it occupied this step, and one Bernoulli draw from its own
//! RNG decides.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use abm_core::{AgentId, Category, PlaceId, SimClock, StateValue, Tick};
use abm_mobility::Occupancy;
use abm_population::{AgentRngs, AgentStore, PlaceKind, PlaceStore};
use abm_states::{StatesManager, Trait};
use abm_transitions::{TransitionCtx, TransitionsManager};

use crate::{InfectionError, InfectionResult};

fn one() -> f64 {
    1.0
}

/// Transmission settings of one place kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KindParams {
    /// β: contact intensity.
    pub contact_intensity: f64,
    /// Time spent at a place of this kind per visit.
    pub dwell_days:        f64,
    /// α: 0 for frequency-independent mixing, 1 for fully density-dependent.
    #[serde(default = "one")]
    pub density_exponent:  f64,
    /// Infectiousness multiplier of isolated occupants.
    #[serde(default = "one")]
    pub isolation_factor:  f64,
    /// Exposure picked up from outside the modelled population.
    #[serde(default)]
    pub outside_lambda:    f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InfectionParams {
    /// Health state a new infection enters.
    pub on_infection: String,
    /// Kinds absent from the map do not transmit.
    #[serde(default)]
    pub places: HashMap<PlaceKind, KindParams>,
}

/// Effective per-place settings after applying per-place overrides.
#[derive(Copy, Clone, Debug, Default)]
struct PlaceParams {
    kind:      usize,
    beta:      f64,
    dwell:     f64,
    alpha:     f64,
    isolation: f64,
    outside:   f64,
}

/// Read-only world state the infection step depends on.
pub struct InfectionCtx<'a> {
    pub agents: &'a AgentStore,
    pub states: &'a StatesManager,
    pub clock:  &'a SimClock,
}

pub struct InfectionModel {
    on_infection: StateValue,
    by_place:     Vec<PlaceParams>,
    scale:        [f64; PlaceKind::COUNT],
}

impl InfectionModel {
    pub fn new(
        params: &InfectionParams,
        places: &PlaceStore,
        states: &StatesManager,
    ) -> InfectionResult<Self> {
        let taxonomy = states.taxonomy();
        let on_infection = taxonomy.require(Category::Health, &params.on_infection)?;
        if !taxonomy.has(Category::Health, on_infection, Trait::Infected) {
            log::warn!(
                "infection.on_infection state {:?} does not carry the `infected` trait",
                params.on_infection
            );
        }

        for (kind, k) in &params.places {
            let values = [
                k.contact_intensity,
                k.dwell_days,
                k.density_exponent,
                k.isolation_factor,
                k.outside_lambda,
            ];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(InfectionError::Config(format!(
                    "{kind}: transmission parameters must be non-negative numbers"
                )));
            }
        }

        let mut by_place = Vec::with_capacity(places.len());
        for place in places.iter() {
            let mut p = params.places.get(&place.kind).map_or_else(PlaceParams::default, |k| PlaceParams {
                kind:      0,
                beta:      k.contact_intensity,
                dwell:     k.dwell_days,
                alpha:     k.density_exponent,
                isolation: k.isolation_factor,
                outside:   k.outside_lambda,
            });
            p.kind = place.kind.index();
            if let Some(t) = &place.transmission {
                if !(t.contact_intensity.is_finite() && t.contact_intensity >= 0.0)
                    || !(t.dwell_days.is_finite() && t.dwell_days >= 0.0)
                {
                    return Err(InfectionError::Config(format!(
                        "{}: transmission override must be non-negative",
                        place.id
                    )));
                }
                p.beta = t.contact_intensity;
                p.dwell = t.dwell_days;
            }
            by_place.push(p);
        }

        Ok(Self { on_infection, by_place, scale: [1.0; PlaceKind::COUNT] })
    }

    pub fn on_infection(&self) -> StateValue {
        self.on_infection
    }

    /// Multiply every `λ_j` of `kind` by `scale` (0 closes the kind) until
    /// the next call.  Negative or non-finite scales are treated as 0.
    pub fn set_contact_scale(&mut self, kind: PlaceKind, scale: f64) {
        self.scale[kind.index()] = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    pub fn contact_scale(&self, kind: PlaceKind) -> f64 {
        self.scale[kind.index()]
    }

    /// Infectiousness `w_i` of one occupant of `place` at `day`.
    fn weight(&self, agent: AgentId, place: usize, day: f64, ctx: &InfectionCtx<'_>) -> f64 {
        let states = ctx.states;
        let health = states.current(agent, Category::Health);
        if !states.taxonomy().has(Category::Health, health, Trait::Infectious) {
            return 0.0;
        }
        let mut w = states.taxonomy().infectiousness(health) * ctx.agents.infectiousness_at(agent, day);
        if states.has(agent, Trait::Isolated) {
            w *= self.by_place[place].isolation;
        }
        w
    }

    fn lambda(&self, place: usize, occupants: &[AgentId], day: f64, ctx: &InfectionCtx<'_>) -> f64 {
        let p = self.by_place[place];
        let scale = self.scale[p.kind];
        if occupants.is_empty() || scale == 0.0 {
            return 0.0;
        }
        let inside = if p.beta == 0.0 {
            0.0
        } else {
            let total: f64 = occupants.iter().map(|&a| self.weight(a, place, day, ctx)).sum();
            p.beta * total / (occupants.len() as f64).powf(p.alpha)
        };
        scale * (inside + p.outside)
    }

    /// `λ_j` for every place, indexed by place id (zero when unoccupied).
    pub fn contributions(&self, now: Tick, occ: &Occupancy, ctx: &InfectionCtx<'_>) -> Vec<f64> {
        let day = ctx.clock.days_at(now);

        #[cfg(not(feature = "parallel"))]
        let lambdas = (0..occ.place_count())
            .map(|j| self.lambda(j, occ.occupants(PlaceId(j as u32)), day, ctx))
            .collect();

        #[cfg(feature = "parallel")]
        let lambdas = (0..occ.place_count())
            .into_par_iter()
            .map(|j| self.lambda(j, occ.occupants(PlaceId(j as u32)), day, ctx))
            .collect();

        lambdas
    }

    /// Infection probability of `agent` given this step's contributions.
    pub fn probability(
        &self,
        agent:   AgentId,
        now:     Tick,
        lambdas: &[f64],
        occ:     &Occupancy,
        ctx:     &InfectionCtx<'_>,
    ) -> f64 {
        if !ctx.states.has_in(agent, Category::Health, Trait::Susceptible) {
            return 0.0;
        }
        let hazard: f64 = occ
            .places_of(agent)
            .iter()
            .map(|p| lambdas[p.index()] * self.by_place[p.index()].dwell)
            .sum();
        if hazard <= 0.0 {
            return 0.0;
        }
        let s = ctx.agents.susceptibility_at(agent, ctx.clock.days_at(now));
        1.0 - (-ctx.clock.step_days * s * hazard).exp()
    }

    /// Agents newly infected this step, ascending id.  Each susceptible agent
    /// with a positive probability draws once from its own RNG.
    pub fn draw(
        &self,
        now:  Tick,
        occ:  &Occupancy,
        ctx:  &InfectionCtx<'_>,
        rngs: &mut AgentRngs,
    ) -> Vec<AgentId> {
        let lambdas = self.contributions(now, occ, ctx);

        #[cfg(not(feature = "parallel"))]
        let infected: Vec<AgentId> = rngs
            .inner
            .iter_mut()
            .enumerate()
            .filter_map(|(i, rng)| {
                let agent = AgentId(i as u32);
                let p = self.probability(agent, now, &lambdas, occ, ctx);
                (p > 0.0 && rng.gen_bool(p)).then_some(agent)
            })
            .collect();

        #[cfg(feature = "parallel")]
        let infected: Vec<AgentId> = rngs
            .inner
            .par_iter_mut()
            .enumerate()
            .filter_map(|(i, rng)| {
                let agent = AgentId(i as u32);
                let p = self.probability(agent, now, &lambdas, occ, ctx);
                (p > 0.0 && rng.gen_bool(p)).then_some(agent)
            })
            .collect();

        infected
    }

    /// Draw this step's infections and write them through the transitions
    /// manager.  Returns the agents actually infected (writes the edge table
    /// rejects are audited and left out).
    pub fn step(
        &self,
        now:  Tick,
        occ:  &Occupancy,
        tm:   &mut TransitionsManager,
        tctx: &mut TransitionCtx<'_>,
    ) -> Vec<AgentId> {
        let drawn = {
            let ctx = InfectionCtx { agents: tctx.agents, states: tm.states(), clock: tctx.clock };
            self.draw(now, occ, &ctx, tctx.rngs)
        };
        let mut infected = Vec::with_capacity(drawn.len());
        for agent in drawn {
            if tm.transition(agent, Category::Health, self.on_infection, now, tctx).is_some() {
                infected.push(agent);
            }
        }
        log::debug!("{now}: {} new infections", infected.len());
        infected
    }
}
