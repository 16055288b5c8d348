//! `TransitionsManager`: per-category schedules and the single write path.

use abm_core::{AgentId, AuditEvent, AuditLog, Category, CurveInputs, SimClock, StateValue, Tick};
use abm_population::{AgentRngs, AgentStore};
use abm_states::{Applied, StatesManager};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::rules::{priority_ranks, Draw, RuleSet};
use crate::{ManagerKind, TransitionError, TransitionResult, TransitionsSpec};

/// A pending transition of one category.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Scheduled {
    pub to:  StateValue,
    pub due: Tick,
}

/// Mutable world state a transition needs besides the schedules themselves.
pub struct TransitionCtx<'a> {
    pub agents: &'a AgentStore,
    pub rngs:   &'a mut AgentRngs,
    pub clock:  &'a SimClock,
    pub audit:  &'a mut AuditLog,
}

/// Owns the [`StatesManager`] so that every state change goes through
/// [`transition`][Self::transition] and is followed by a reschedule.
pub struct TransitionsManager {
    states: StatesManager,
    rules:  [RuleSet; ManagerKind::COUNT],
    kind:   Vec<ManagerKind>,
    ranks:  [u8; Category::COUNT],
    next:   Vec<[Option<Scheduled>; Category::COUNT]>,
}

impl TransitionsManager {
    pub fn new(
        states: StatesManager,
        spec:   &TransitionsSpec,
        agents: &AgentStore,
    ) -> TransitionResult<Self> {
        if states.len() != agents.count {
            return Err(TransitionError::Config(format!(
                "states manager holds {} agents, population has {}",
                states.len(),
                agents.count
            )));
        }
        let taxonomy = states.taxonomy();
        let rules = [
            RuleSet::compile(taxonomy, &spec.regular, ManagerKind::Regular)?,
            RuleSet::compile(taxonomy, &spec.hospital_employee, ManagerKind::HospitalEmployee)?,
            RuleSet::compile(taxonomy, &spec.hospital_patient, ManagerKind::HospitalPatient)?,
        ];
        let ranks = priority_ranks(&spec.category_priority)?;
        let kind = agents.kind.iter().map(|&k| ManagerKind::for_kind(k)).collect();

        Ok(Self {
            next: vec![[None; Category::COUNT]; agents.count],
            states,
            rules,
            kind,
            ranks,
        })
    }

    pub fn states(&self) -> &StatesManager {
        &self.states
    }

    #[inline]
    pub fn manager_kind(&self, agent: AgentId) -> ManagerKind {
        self.kind[agent.index()]
    }

    /// The pending transition of one category, if any.
    #[inline]
    pub fn pending(&self, agent: AgentId, category: Category) -> Option<Scheduled> {
        self.next[agent.index()][category.index()]
    }

    /// The next due transition across the agent's categories; ties on the due
    /// tick go to the category earliest in `category_priority`.
    pub fn schedule(&self, agent: AgentId) -> Option<(Category, StateValue, Tick)> {
        let row = &self.next[agent.index()];
        Category::ALL
            .iter()
            .filter_map(|&c| row[c.index()].map(|s| (c, s)))
            .min_by_key(|(c, s)| (s.due, self.ranks[c.index()]))
            .map(|(c, s)| (c, s.to, s.due))
    }

    /// Sample the next transition out of the agent's current value of
    /// `category`, replacing any pending one.
    pub fn reschedule(
        &mut self,
        agent:    AgentId,
        category: Category,
        now:      Tick,
        ctx:      &mut TransitionCtx<'_>,
    ) -> Option<Scheduled> {
        let i = agent.index();
        let from = self.states.current(agent, category);
        let kind = self.kind[i];
        let rule = self.rules[kind.index()]
            .get(category, from)
            .or_else(|| self.rules[ManagerKind::Regular.index()].get(category, from));

        let scheduled = rule.and_then(|rule| {
            let day = ctx.clock.days_at(now);
            let mut draw = Draw {
                agent,
                now,
                inputs: CurveInputs { age: f64::from(ctx.agents.age[i]), sim_day: day },
                severity: ctx.agents.severity_multiplier(agent, day),
                audit: &mut *ctx.audit,
            };
            let rng = ctx.rngs.get_mut(agent);
            let to = rule.pick(&mut draw, rng)?;
            let days = rule.duration_days(&mut draw, rng);
            let ticks = ctx.clock.ticks_for_days(days).max(1);
            Some(Scheduled { to, due: now.offset(ticks) })
        });

        self.next[i][category.index()] = scheduled;
        scheduled
    }

    /// Schedule every category of every agent from its initial value.
    pub fn schedule_all(&mut self, start: Tick, ctx: &mut TransitionCtx<'_>) {
        for agent in ctx.agents.agent_ids() {
            for c in Category::ALL {
                self.reschedule(agent, c, start, ctx);
            }
        }
    }

    /// Write `category = to` for `agent` at `now`, then reschedule every
    /// category the write touched.
    ///
    /// Rejected writes are audited and dropped; `None` is returned and the
    /// agent keeps its state.
    pub fn transition(
        &mut self,
        agent:    AgentId,
        category: Category,
        to:       StateValue,
        now:      Tick,
        ctx:      &mut TransitionCtx<'_>,
    ) -> Option<Applied> {
        match self.states.set(agent, category, to, now) {
            Ok(applied) => {
                for w in &applied.writes {
                    self.reschedule(agent, w.category, now, ctx);
                }
                Some(applied)
            }
            Err(e) => {
                ctx.audit.record(AuditEvent::InvalidTransition {
                    tick: now,
                    agent,
                    category,
                    detail: e.to_string(),
                });
                None
            }
        }
    }

    /// Apply every transition due at or before `now`, agents in ascending id,
    /// each agent's transitions earliest first.  Returns the number applied.
    pub fn advance(&mut self, now: Tick, ctx: &mut TransitionCtx<'_>) -> usize {
        let due = self.due_agents(now);
        let mut applied = 0;

        for agent in due {
            while let Some((category, to, due)) = self.schedule(agent) {
                if due > now {
                    break;
                }
                self.next[agent.index()][category.index()] = None;
                if self.transition(agent, category, to, now, ctx).is_some() {
                    applied += 1;
                }
            }
        }

        log::debug!("{now}: {applied} scheduled transitions applied");
        applied
    }

    #[cfg(not(feature = "parallel"))]
    fn due_agents(&self, now: Tick) -> Vec<AgentId> {
        self.next
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().flatten().any(|s| s.due <= now))
            .map(|(i, _)| AgentId(i as u32))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn due_agents(&self, now: Tick) -> Vec<AgentId> {
        self.next
            .par_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().flatten().any(|s| s.due <= now))
            .map(|(i, _)| AgentId(i as u32))
            .collect()
    }
}
