//! Aggregate picture of one completed step.

use abm_core::{Category, Tick};
use abm_states::StatesManager;

#[derive(Clone, Debug, PartialEq)]
pub struct StepSnapshot {
    pub tick:                  Tick,
    pub day:                   f64,
    /// Agents per state value, one `Vec` per category in `Category::ALL`
    /// order, indexed by `StateValue`.
    pub counts:                [Vec<u32>; Category::COUNT],
    pub new_infections:        u32,
    /// Agents ever infected, including those infected at start.
    pub cumulative_infections: u64,
    /// Scheduled transitions applied this step.
    pub transitions:           u32,
    pub flu_sick:              u32,
    pub tests:                 u32,
    pub new_confirmed:         u32,
    pub doses:                 u32,
    /// Contacts placed under notice this step.
    pub traced:                u32,
    pub rerouted:              u32,
    pub fell_back:             u32,
}

impl StepSnapshot {
    pub(crate) fn counts_of(states: &StatesManager) -> [Vec<u32>; Category::COUNT] {
        Category::ALL.map(|c| states.counts(c))
    }

    pub fn count(&self, category: Category, states: &StatesManager, name: &str) -> u32 {
        states
            .taxonomy()
            .lookup(category, name)
            .map_or(0, |v| self.counts[category.index()][v.index()])
    }
}
