//! The authoritative composite state of every agent.

use abm_core::{AgentId, Category, StateValue, Tick};
use abm_population::{AgentKind, AgentStore, InitialStates};

use crate::edges::VariantTables;
use crate::{StateError, StateResult, StatesSpec, Taxonomy, Trait, TransitionFault};

/// States-manager variant governing an agent.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum StatesVariant {
    Regular,
    HospitalEmployee,
}

impl StatesVariant {
    pub fn for_kind(kind: AgentKind) -> Self {
        match kind {
            AgentKind::HospitalEmployee => StatesVariant::HospitalEmployee,
            AgentKind::Regular | AgentKind::HospitalPatient => StatesVariant::Regular,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// One committed category change.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Write {
    pub category: Category,
    pub from:     StateValue,
    pub to:       StateValue,
}

/// Every write committed by one [`StatesManager::set`] call: the requested
/// write first, then any writes forced by coupling rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub writes: Vec<Write>,
}

impl Applied {
    pub fn touched(&self, category: Category) -> bool {
        self.writes.iter().any(|w| w.category == category)
    }
}

/// Owns the composite state (one value per category per agent) and the
/// entry tick of each value.
pub struct StatesManager {
    taxonomy: Taxonomy,
    tables:   [VariantTables; 2],
    variant:  Vec<StatesVariant>,
    values:   Vec<[StateValue; Category::COUNT]>,
    entered:  Vec<[Tick; Category::COUNT]>,
}

impl StatesManager {
    /// Compile the edge tables and resolve every agent's initial values.
    ///
    /// Fails on unknown state names and malformed tables; these are
    /// configuration-integrity faults.
    pub fn new(
        taxonomy: Taxonomy,
        spec:     &StatesSpec,
        agents:   &AgentStore,
        initial:  &[InitialStates],
    ) -> StateResult<Self> {
        if initial.len() != agents.count {
            return Err(StateError::AgentCountMismatch {
                expected: agents.count,
                got:      initial.len(),
                what:     "initial state assignments",
            });
        }

        let regular = VariantTables::compile(&taxonomy, &spec.regular, "regular")?;
        let employee = match &spec.hospital_employee {
            Some(s) => VariantTables::compile(&taxonomy, s, "hospital_employee")?,
            None => regular.clone(),
        };

        let defaults = Category::ALL.map(|c| taxonomy.initial(c));
        let mut values = Vec::with_capacity(agents.count);
        for init in initial {
            let mut v = defaults;
            for c in Category::ALL {
                if let Some(name) = init.get(c) {
                    v[c.index()] = taxonomy.require(c, name)?;
                }
            }
            values.push(v);
        }

        let variant = agents.kind.iter().map(|&k| StatesVariant::for_kind(k)).collect();

        Ok(Self {
            taxonomy,
            tables: [regular, employee],
            variant,
            values,
            entered: vec![[Tick::ZERO; Category::COUNT]; agents.count],
        })
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn variant(&self, agent: AgentId) -> StatesVariant {
        self.variant[agent.index()]
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn current(&self, agent: AgentId, category: Category) -> StateValue {
        self.values[agent.index()][category.index()]
    }

    /// All four values of one agent.
    #[inline]
    pub fn composite(&self, agent: AgentId) -> [StateValue; Category::COUNT] {
        self.values[agent.index()]
    }

    /// Tick at which the current value of `category` was entered.
    #[inline]
    pub fn entered_at(&self, agent: AgentId, category: Category) -> Tick {
        self.entered[agent.index()][category.index()]
    }

    /// Does any category's current value carry trait `t`?
    #[inline]
    pub fn has(&self, agent: AgentId, t: Trait) -> bool {
        let v = &self.values[agent.index()];
        Category::ALL
            .iter()
            .any(|&c| self.taxonomy.has(c, v[c.index()], t))
    }

    /// Does the current value of `category` carry trait `t`?
    #[inline]
    pub fn has_in(&self, agent: AgentId, category: Category, t: Trait) -> bool {
        self.taxonomy.has(category, self.current(agent, category), t)
    }

    /// Name of the agent's current value in `category`.
    pub fn name_of(&self, agent: AgentId, category: Category) -> &str {
        self.taxonomy.name(category, self.current(agent, category))
    }

    /// Number of agents holding each value of `category`, indexed by value.
    pub fn counts(&self, category: Category) -> Vec<u32> {
        let mut counts = vec![0u32; self.taxonomy.len(category)];
        for v in &self.values {
            counts[v[category.index()].index()] += 1;
        }
        counts
    }

    // ── Edge checks ───────────────────────────────────────────────────────

    pub fn is_valid_transition(
        &self,
        variant:  StatesVariant,
        category: Category,
        from:     StateValue,
        to:       StateValue,
    ) -> bool {
        self.tables[variant.index()].edges[category.index()].permits(from, to)
    }

    /// Would `agent` be allowed to move `category` to `to` right now
    /// (ignoring coupling)?
    pub fn permits(&self, agent: AgentId, category: Category, to: StateValue) -> bool {
        self.is_valid_transition(self.variant(agent), category, self.current(agent, category), to)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Move `category` of `agent` to `value` at `time`, together with every
    /// write forced by the variant's coupling rules.
    ///
    /// All writes are validated before any is committed; on error nothing
    /// changes.  Forced writes do not trigger further coupling.
    pub fn set(
        &mut self,
        agent:    AgentId,
        category: Category,
        value:    StateValue,
        time:     Tick,
    ) -> Result<Applied, StateError> {
        let i = agent.index();
        let tables = &self.tables[self.variant[i].index()];
        let current = self.values[i];
        let entered = self.entered[i];

        let from = current[category.index()];
        if time < entered[category.index()] {
            return Err(self.invalid(agent, category, from, value, TransitionFault::TimeRegression));
        }
        if !tables.edges[category.index()].permits(from, value) {
            return Err(self.invalid(agent, category, from, value, TransitionFault::EdgeNotPermitted));
        }

        let mut writes = vec![Write { category, from, to: value }];

        for rule in &tables.coupling {
            if !rule.matches(&self.taxonomy, category, value) {
                continue;
            }
            let target_from = current[rule.target.index()];
            if let Some(from_set) = &rule.from {
                if !from_set.contains(&target_from) {
                    continue;
                }
            }
            if let Some(prev) = writes.iter().find(|w| w.category == rule.target) {
                if prev.to != rule.value {
                    return Err(self.invalid(
                        agent,
                        rule.target,
                        target_from,
                        rule.value,
                        TransitionFault::ConflictingCoupling,
                    ));
                }
                continue;
            }
            if target_from == rule.value {
                continue;
            }
            if time < entered[rule.target.index()] {
                return Err(self.invalid(agent, rule.target, target_from, rule.value, TransitionFault::TimeRegression));
            }
            if !tables.edges[rule.target.index()].permits(target_from, rule.value) {
                return Err(self.invalid(
                    agent,
                    rule.target,
                    target_from,
                    rule.value,
                    TransitionFault::CouplingEdgeNotPermitted,
                ));
            }
            writes.push(Write { category: rule.target, from: target_from, to: rule.value });
        }

        for w in &writes {
            self.values[i][w.category.index()] = w.to;
            self.entered[i][w.category.index()] = time;
            log::trace!(
                "{time} {agent}: {} {} -> {}",
                w.category,
                self.taxonomy.name(w.category, w.from),
                self.taxonomy.name(w.category, w.to)
            );
        }

        Ok(Applied { writes })
    }

    fn invalid(
        &self,
        agent:    AgentId,
        category: Category,
        from:     StateValue,
        to:       StateValue,
        fault:    TransitionFault,
    ) -> StateError {
        StateError::InvalidTransition {
            agent,
            category,
            from: self.taxonomy.name(category, from).to_owned(),
            to: self.taxonomy.name(category, to).to_owned(),
            fault,
        }
    }
}
