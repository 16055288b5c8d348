//! Where each agent is in each slot, and what happens when a place is full.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use abm_core::{AgentId, AgentRng, AuditEvent, AuditLog, PlaceId, Tick};
use abm_population::{AgentKind, AgentRngs, AgentStore, PlaceKind, PlaceStore};
use abm_states::{StatesManager, Trait};
use abm_transitions::SeasonalFlu;

use crate::{MobilityError, MobilityResult, Occupancy, PlaceSet, Slot};

/// What to do with an arrival at a full place.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Try the other places of the same kind, ascending id after the full
    /// one and wrapping; fall back home when all are full.
    Reroute,
    /// Send the agent home.
    Fallback,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MobilityParams {
    /// Probability an agent visits a leisure place in a step.
    #[serde(default)]
    pub leisure_fraction: f64,
    /// Per-kind overrides; visitor kinds default to `reroute`, the rest to
    /// `fallback`.
    #[serde(default)]
    pub overflow: HashMap<PlaceKind, OverflowPolicy>,
}

/// Read-only world state placement depends on.
pub struct MobilityCtx<'a> {
    pub agents: &'a AgentStore,
    pub places: &'a PlaceStore,
    pub states: &'a StatesManager,
    pub flu:    &'a SeasonalFlu,
}

pub struct Mobility {
    leisure_fraction: f64,
    leisure_scale:    f64,
    policy:           [OverflowPolicy; PlaceKind::COUNT],
    default_hospital: PlaceId,
}

impl Mobility {
    pub fn new(params: &MobilityParams, places: &PlaceStore) -> MobilityResult<Self> {
        if !(0.0..=1.0).contains(&params.leisure_fraction) {
            return Err(MobilityError::Config(format!(
                "leisure_fraction {} is not a probability",
                params.leisure_fraction
            )));
        }
        if params.leisure_fraction > 0.0 && places.of_kind(PlaceKind::Leisure).is_empty() {
            log::warn!("leisure_fraction is set but there are no leisure places");
        }

        let mut policy = PlaceKind::ALL.map(|k| {
            if k.admits_visitors() { OverflowPolicy::Reroute } else { OverflowPolicy::Fallback }
        });
        for (&kind, &p) in &params.overflow {
            if p == OverflowPolicy::Reroute && !kind.admits_visitors() {
                return Err(MobilityError::Config(format!(
                    "{kind} places only admit their own agents and cannot take rerouted visitors"
                )));
            }
            policy[kind.index()] = p;
        }

        Ok(Self {
            leisure_fraction: params.leisure_fraction,
            leisure_scale: 1.0,
            policy,
            default_hospital: places
                .of_kind(PlaceKind::Hospital)
                .first()
                .copied()
                .unwrap_or(PlaceId::INVALID),
        })
    }

    pub fn policy(&self, kind: PlaceKind) -> OverflowPolicy {
        self.policy[kind.index()]
    }

    /// Scale the configured leisure fraction, e.g. during a lockdown.
    pub fn set_leisure_scale(&mut self, scale: f64) {
        self.leisure_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    /// Probability an agent visits a leisure place this step.
    pub fn leisure_fraction(&self) -> f64 {
        (self.leisure_fraction * self.leisure_scale).min(1.0)
    }

    fn hospital_of(&self, agents: &AgentStore, agent: AgentId) -> PlaceId {
        let h = agents.hospital[agent.index()];
        if h.is_valid() { h } else { self.default_hospital }
    }

    /// Places `agent` wants to be in during `slot`.
    ///
    /// Only the leisure slot draws from `rng`.
    pub fn place_for(
        &self,
        agent: AgentId,
        slot:  Slot,
        ctx:   &MobilityCtx<'_>,
        rng:   &mut AgentRng,
    ) -> PlaceSet {
        let i = agent.index();
        let agents = ctx.agents;
        let states = ctx.states;

        if states.has(agent, Trait::Dead) {
            return PlaceSet::EMPTY;
        }
        if agents.kind[i] == AgentKind::HospitalPatient || states.has(agent, Trait::Hospitalized) {
            return match slot {
                Slot::Home => {
                    let h = self.hospital_of(agents, agent);
                    PlaceSet::one(if h.is_valid() { h } else { agents.home(agent) })
                }
                _ => PlaceSet::EMPTY,
            };
        }
        if states.has(agent, Trait::Isolated) {
            return match slot {
                Slot::Home => PlaceSet::one(agents.home(agent)),
                _ => PlaceSet::EMPTY,
            };
        }

        match slot {
            Slot::Home => PlaceSet::one(agents.home(agent)),
            Slot::Daytime => self.daytime(agents, agent),
            Slot::Commute => {
                if self.daytime(agents, agent).is_empty() {
                    PlaceSet::EMPTY
                } else {
                    PlaceSet::one(agents.transit[i])
                }
            }
            Slot::Leisure => {
                let fraction = self.leisure_fraction();
                if fraction <= 0.0 || ctx.flu.presents_symptoms(states, agent) {
                    return PlaceSet::EMPTY;
                }
                if !rng.gen_bool(fraction) {
                    return PlaceSet::EMPTY;
                }
                rng.choose(ctx.places.of_kind(PlaceKind::Leisure))
                    .map_or(PlaceSet::EMPTY, |&p| PlaceSet::one(p))
            }
        }
    }

    fn daytime(&self, agents: &AgentStore, agent: AgentId) -> PlaceSet {
        let i = agent.index();
        let mut set = PlaceSet::EMPTY;
        set.push(agents.school[i]);
        if !agents.works_from_home[i] {
            match agents.kind[i] {
                AgentKind::HospitalEmployee => set.push(self.hospital_of(agents, agent)),
                _ => set.push(agents.work[i]),
            }
        }
        set
    }

    /// Hospitalized agents with a household of their own: they take a
    /// hospital bed only when one is left after the assigned patients.
    fn is_hospital_visitor(&self, agent: AgentId, ctx: &MobilityCtx<'_>) -> bool {
        ctx.agents.kind[agent.index()] != AgentKind::HospitalPatient
            && ctx.states.has(agent, Trait::Hospitalized)
            && !ctx.states.has(agent, Trait::Dead)
    }

    fn place_slot(
        &self,
        now:   Tick,
        agent: AgentId,
        slot:  Slot,
        ctx:   &MobilityCtx<'_>,
        rng:   &mut AgentRng,
        audit: &mut AuditLog,
        occ:   &mut Occupancy,
    ) -> MobilityResult<()> {
        for place in self.place_for(agent, slot, ctx, rng).iter() {
            if occ.admit(place, agent).is_err() {
                self.overflow(now, agent, place, ctx, audit, occ)?;
            }
        }
        Ok(())
    }

    /// Build the step's occupancy: every living agent in every slot, agents
    /// in ascending id, applying the overflow policy at full places.
    ///
    /// The home slot goes first and in two passes: residents and assigned
    /// patients, then hospitalized visitors.  Assigned occupants always fit
    /// (the population builder checks their capacity), so a full hospital
    /// only ever turns visitors or staff back to their households.
    pub fn place_all(
        &self,
        now:   Tick,
        ctx:   &MobilityCtx<'_>,
        rngs:  &mut AgentRngs,
        audit: &mut AuditLog,
        occ:   &mut Occupancy,
    ) -> MobilityResult<()> {
        occ.clear();
        let mut visitors = Vec::new();
        for agent in ctx.agents.agent_ids() {
            if self.is_hospital_visitor(agent, ctx) {
                visitors.push(agent);
            } else {
                self.place_slot(now, agent, Slot::Home, ctx, rngs.get_mut(agent), audit, occ)?;
            }
        }
        for agent in visitors {
            self.place_slot(now, agent, Slot::Home, ctx, rngs.get_mut(agent), audit, occ)?;
        }
        for agent in ctx.agents.agent_ids() {
            for slot in Slot::ALL.into_iter().filter(|&s| s != Slot::Home) {
                self.place_slot(now, agent, slot, ctx, rngs.get_mut(agent), audit, occ)?;
            }
        }
        log::debug!(
            "{now}: placed {} agents ({} rerouted, {} fell back)",
            ctx.agents.count,
            occ.rerouted,
            occ.fell_back
        );
        Ok(())
    }

    fn overflow(
        &self,
        now:   Tick,
        agent: AgentId,
        full:  PlaceId,
        ctx:   &MobilityCtx<'_>,
        audit: &mut AuditLog,
        occ:   &mut Occupancy,
    ) -> MobilityResult<()> {
        let kind = ctx.places.kind(full);

        if self.policy(kind) == OverflowPolicy::Reroute {
            let same = ctx.places.of_kind(kind);
            let start = same.partition_point(|&p| p <= full);
            let next = same[start..]
                .iter()
                .chain(&same[..start])
                .copied()
                .find(|&p| p != full && occ.has_room(p));
            if let Some(to) = next {
                if occ.admit(to, agent).is_ok() {
                    occ.rerouted += 1;
                    audit.record(AuditEvent::Rerouted { tick: now, agent, from: full, to });
                    return Ok(());
                }
            }
            log::warn!("{now}: every {kind} is full, {agent} falls back home");
        }

        // Only reachable when assigned occupancy exceeds a capacity.
        let home = ctx.agents.home(agent);
        if !home.is_valid() || home == full || occ.admit(home, agent).is_err() {
            return Err(MobilityError::CapacityExceeded { place: full, kind, agent });
        }
        occ.fell_back += 1;
        audit.record(AuditEvent::FellBack { tick: now, agent, from: full, to: home });
        Ok(())
    }
}
