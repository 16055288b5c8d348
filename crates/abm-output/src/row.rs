//! Plain data row types written by output backends.

use abm_core::{AgentId, Category, Tick};
use abm_population::AgentStore;
use abm_sim::StepSnapshot;
use abm_states::StatesManager;

/// One agent's composite state at an output tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStateRow {
    pub agent_id:    u32,
    pub tick:        u64,
    pub health:      String,
    pub role:        String,
    pub testing:     String,
    pub vaccination: String,
    /// Vaccine doses received; 0 when unprotected.
    pub doses:       u8,
}

impl AgentStateRow {
    pub fn collect(tick: Tick, states: &StatesManager, agents: &AgentStore) -> Vec<Self> {
        agents
            .agent_ids()
            .map(|a: AgentId| AgentStateRow {
                agent_id:    a.0,
                tick:        tick.0,
                health:      states.name_of(a, Category::Health).to_owned(),
                role:        states.name_of(a, Category::Role).to_owned(),
                testing:     states.name_of(a, Category::Testing).to_owned(),
                vaccination: states.name_of(a, Category::Vaccination).to_owned(),
                doses:       agents.protection[a.index()].as_ref().map_or(0, |p| p.doses),
            })
            .collect()
    }
}

/// Aggregate numbers of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummaryRow {
    pub tick:                  u64,
    pub day:                   f64,
    pub new_infections:        u32,
    pub cumulative_infections: u64,
    pub transitions:           u32,
    pub flu_sick:              u32,
    pub tests:                 u32,
    pub new_confirmed:         u32,
    pub doses:                 u32,
    pub traced:                u32,
    pub rerouted:              u32,
    pub fell_back:             u32,
}

impl From<&StepSnapshot> for StepSummaryRow {
    fn from(s: &StepSnapshot) -> Self {
        Self {
            tick:                  s.tick.0,
            day:                   s.day,
            new_infections:        s.new_infections,
            cumulative_infections: s.cumulative_infections,
            transitions:           s.transitions,
            flu_sick:              s.flu_sick,
            tests:                 s.tests,
            new_confirmed:         s.new_confirmed,
            doses:                 s.doses,
            traced:                s.traced,
            rerouted:              s.rerouted,
            fell_back:             s.fell_back,
        }
    }
}

/// Agents in one state of one category at a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCountRow {
    pub tick:     u64,
    pub category: &'static str,
    pub state:    String,
    pub count:    u32,
}

impl StateCountRow {
    /// One row per state value of every category, zero counts included.
    pub fn collect(snapshot: &StepSnapshot, states: &StatesManager) -> Vec<Self> {
        let taxonomy = states.taxonomy();
        Category::ALL
            .iter()
            .flat_map(|&c| {
                taxonomy.values(c).map(move |v| StateCountRow {
                    tick:     snapshot.tick.0,
                    category: c.name(),
                    state:    taxonomy.name(c, v).to_owned(),
                    count:    snapshot.counts[c.index()].get(v.index()).copied().unwrap_or(0),
                })
            })
            .collect()
    }
}
