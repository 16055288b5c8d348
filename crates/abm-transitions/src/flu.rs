//! Seasonal flu: non-pathogen illness that looks like the real thing.
//!
//! Flu never touches the health category.  A flu-sick agent *presents
//! symptoms* (so it may seek a test and skips leisure) and, when tested
//! while uninfected, comes back positive with its own false-positive rate.
//!
//! From `start_day` the overlay keeps `fraction` of the eligible population
//! sick: regular agents that are not infected, not dead and not vaccinated.
//! Each step recovered agents are replaced from those never yet sick.

use serde::{Deserialize, Serialize};

use abm_core::{AgentId, SimClock, SimRng, Tick};
use abm_population::{AgentKind, AgentStore};
use abm_states::{StatesManager, Trait};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FluParams {
    /// Simulated day the overlay switches on.
    #[serde(default)]
    pub start_day:     f64,
    /// Share of eligible agents kept sick, in [0, 1].
    pub fraction:      f64,
    /// How long one bout lasts.
    pub duration_days: f64,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum FluStatus {
    #[default]
    None,
    Sick { until: Tick },
    Recovered,
}

pub struct SeasonalFlu {
    params: Option<FluParams>,
    status: Vec<FluStatus>,
    sick:   usize,
}

impl SeasonalFlu {
    pub fn new(params: Option<FluParams>, agent_count: usize) -> Self {
        Self {
            params,
            status: vec![FluStatus::None; agent_count],
            sick: 0,
        }
    }

    /// An overlay that never makes anyone sick.
    pub fn disabled(agent_count: usize) -> Self {
        Self::new(None, agent_count)
    }

    #[inline]
    pub fn status(&self, agent: AgentId) -> FluStatus {
        self.status[agent.index()]
    }

    #[inline]
    pub fn is_sick(&self, agent: AgentId) -> bool {
        matches!(self.status[agent.index()], FluStatus::Sick { .. })
    }

    pub fn sick_count(&self) -> usize {
        self.sick
    }

    /// Does the agent show symptoms, from its health state or from flu?
    #[inline]
    pub fn presents_symptoms(&self, states: &StatesManager, agent: AgentId) -> bool {
        self.is_sick(agent) || states.has(agent, Trait::Symptomatic)
    }

    fn eligible(states: &StatesManager, agents: &AgentStore, agent: AgentId) -> bool {
        agents.kind[agent.index()] == AgentKind::Regular
            && !states.has(agent, Trait::Infected)
            && !states.has(agent, Trait::Dead)
            && !states.has(agent, Trait::Vaccinated)
    }

    /// Recover finished bouts, drop agents that stopped being eligible, and
    /// top the sick pool back up to the target fraction.  Returns the number
    /// of new flu cases.
    pub fn step(
        &mut self,
        now:    Tick,
        clock:  &SimClock,
        states: &StatesManager,
        agents: &AgentStore,
        rng:    &mut SimRng,
    ) -> usize {
        let Some(params) = &self.params else { return 0 };
        if clock.days_at(now) < params.start_day {
            return 0;
        }

        let mut pool = Vec::new();
        let mut eligible_total = 0usize;
        for agent in agents.agent_ids() {
            let i = agent.index();
            let eligible = Self::eligible(states, agents, agent);
            match self.status[i] {
                FluStatus::Sick { until } if until <= now || !eligible => {
                    self.status[i] = FluStatus::Recovered;
                    self.sick -= 1;
                }
                FluStatus::Sick { .. } => eligible_total += 1,
                FluStatus::None if eligible => {
                    eligible_total += 1;
                    pool.push(agent);
                }
                FluStatus::None | FluStatus::Recovered => {}
            }
        }

        let target = (params.fraction * eligible_total as f64).round() as usize;
        let need = target.saturating_sub(self.sick);
        if need == 0 || pool.is_empty() {
            return 0;
        }

        let until = now.offset(clock.ticks_for_days(params.duration_days).max(1));
        let picked = rng.sample_indices(pool.len(), need);
        for &k in &picked {
            self.status[pool[k].index()] = FluStatus::Sick { until };
        }
        self.sick += picked.len();
        log::debug!("{now}: {} new flu cases ({} sick)", picked.len(), self.sick);
        picked.len()
    }
}
