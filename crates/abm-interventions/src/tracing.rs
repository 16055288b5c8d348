//! Contact tracing.
//!
//! Every step, occupants of traced place kinds record a bounded sample of
//! their co-occupants.  Each distinct pair is kept once on both endpoints
//! for a rolling window.  When an agent is confirmed positive, its distinct contacts inside
//! the window are notified: they move to the quarantine role of their variant
//! and are obliged to test.
//!
//! A case stays *active* until [`ContactTracing::resolve`] closes it, and
//! tracing an active case again yields nothing new.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use abm_core::{AgentId, Category, PlaceId, SimClock, SimRng, StateValue, Tick};
use abm_mobility::Occupancy;
use abm_population::{PlaceKind, PlaceStore};
use abm_states::{StatesManager, StatesVariant, Trait};
use abm_transitions::{TransitionCtx, TransitionsManager};

use crate::{InterventionError, InterventionResult, Testing};

#[cfg(feature = "fx-hash")]
type Map<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type Map<K, V> = HashMap<K, V>;

fn one() -> f64 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TracingParams {
    pub window_days:               f64,
    /// Chance a notified contact actually complies.
    #[serde(default = "one")]
    pub compliance:                f64,
    /// Traced kinds and how many co-occupants one occupant records there.
    pub max_contacts:              HashMap<PlaceKind, usize>,
    pub quarantine_state:          String,
    /// Role state for hospital employees; defaults to `quarantine_state`.
    #[serde(default)]
    pub employee_quarantine_state: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Contact {
    pub other: AgentId,
    pub place: PlaceId,
    pub tick:  Tick,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceOutcome {
    /// Every contact notified on behalf of this case, ascending.
    pub notified:       Vec<AgentId>,
    /// Those not already under notice from another active case.
    pub newly_notified: Vec<AgentId>,
}

pub struct ContactTracing {
    params:     TracingParams,
    quarantine: [StateValue; 2],
    /// Per place kind; `None` for kinds that are not traced.
    limits:     Vec<Option<usize>>,
    contacts:   Vec<VecDeque<Contact>>,
    cases:      Map<AgentId, Vec<AgentId>>,
    notices:    Map<AgentId, u32>,
}

impl ContactTracing {
    pub fn new(params: TracingParams, states: &StatesManager) -> InterventionResult<Self> {
        if !(params.window_days.is_finite() && params.window_days >= 0.0) {
            return Err(InterventionError::config("tracing", "window_days must be non-negative"));
        }
        if !(0.0..=1.0).contains(&params.compliance) {
            return Err(InterventionError::config(
                "tracing",
                format!("compliance {} is not a probability", params.compliance),
            ));
        }
        let taxonomy = states.taxonomy();
        let regular = taxonomy.require(Category::Role, &params.quarantine_state)?;
        let employee = match &params.employee_quarantine_state {
            Some(name) => taxonomy.require(Category::Role, name)?,
            None => regular,
        };
        let mut limits = vec![None; PlaceKind::COUNT];
        for (kind, &max) in &params.max_contacts {
            limits[kind.index()] = Some(max);
        }
        Ok(Self {
            params,
            quarantine: [regular, employee],
            limits,
            contacts: vec![VecDeque::new(); states.len()],
            cases: Map::default(),
            notices: Map::default(),
        })
    }

    pub fn contacts_of(&self, agent: AgentId) -> &VecDeque<Contact> {
        &self.contacts[agent.index()]
    }

    pub fn is_active(&self, index: AgentId) -> bool {
        self.cases.contains_key(&index)
    }

    /// Active index cases, ascending.
    pub fn active_cases(&self) -> Vec<AgentId> {
        let mut cases: Vec<AgentId> = self.cases.keys().copied().collect();
        cases.sort_unstable();
        cases
    }

    /// Is `agent` under notice from any active case?
    pub fn is_notified(&self, agent: AgentId) -> bool {
        self.notices.contains_key(&agent)
    }

    /// Record this step's co-presence at traced places.  Returns the number
    /// of distinct pairs recorded; each pair is stored once on either end.
    pub fn record(&mut self, occ: &Occupancy, now: Tick, places: &PlaceStore, rng: &mut SimRng) -> usize {
        let mut recorded = 0;
        let mut pairs = Vec::new();
        for (place, occupants) in occ.occupied() {
            let Some(max) = self.limits[places.kind(place).index()] else { continue };
            if max == 0 || occupants.len() < 2 {
                continue;
            }
            pairs.clear();
            for (i, &a) in occupants.iter().enumerate() {
                let others = occupants.len() - 1;
                let picks: Vec<usize> = if others <= max {
                    (0..others).collect()
                } else {
                    rng.sample_indices(others, max)
                };
                for k in picks {
                    // Skip over `a` itself.
                    let b = occupants[if k < i { k } else { k + 1 }];
                    pairs.push(if a < b { (a, b) } else { (b, a) });
                }
            }
            pairs.sort_unstable();
            pairs.dedup();
            for &(a, b) in &pairs {
                self.contacts[a.index()].push_back(Contact { other: b, place, tick: now });
                self.contacts[b.index()].push_back(Contact { other: a, place, tick: now });
            }
            recorded += pairs.len();
        }
        log::trace!("{now}: {recorded} contact pairs recorded");
        recorded
    }

    /// Open a case for `index` and pick the contacts to notify.
    pub fn trace(
        &mut self,
        index:  AgentId,
        now:    Tick,
        states: &StatesManager,
        clock:  &SimClock,
        rng:    &mut SimRng,
    ) -> TraceOutcome {
        if states.has(index, Trait::Hospitalized) {
            return TraceOutcome::default();
        }
        if let Some(notified) = self.cases.get(&index) {
            return TraceOutcome { notified: notified.clone(), newly_notified: Vec::new() };
        }

        let mut candidates: Vec<AgentId> = self.contacts[index.index()]
            .iter()
            .filter(|c| clock.days_between(c.tick, now) <= self.params.window_days)
            .map(|c| c.other)
            .filter(|&b| b != index)
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut outcome = TraceOutcome::default();
        for b in candidates {
            if states.has(b, Trait::Dead) || states.has(b, Trait::Hospitalized) {
                continue;
            }
            if !rng.gen_bool(self.params.compliance) {
                continue;
            }
            outcome.notified.push(b);
            let count = self.notices.entry(b).or_insert(0);
            if *count == 0 {
                outcome.newly_notified.push(b);
            }
            *count += 1;
        }
        self.cases.insert(index, outcome.notified.clone());
        log::debug!(
            "{now}: case {index} notified {} contacts ({} new)",
            outcome.notified.len(),
            outcome.newly_notified.len()
        );
        outcome
    }

    /// Quarantine and oblige testing for every newly notified contact.
    /// Returns how many were quarantined.
    pub fn notify(
        &self,
        outcome: &TraceOutcome,
        now:     Tick,
        tm:      &mut TransitionsManager,
        testing: Option<&mut Testing>,
        tctx:    &mut TransitionCtx<'_>,
    ) -> usize {
        let mut quarantined = 0;
        for &b in &outcome.newly_notified {
            let target = match tm.states().variant(b) {
                StatesVariant::Regular => self.quarantine[0],
                StatesVariant::HospitalEmployee => self.quarantine[1],
            };
            if tm.states().current(b, Category::Role) == target
                || tm.transition(b, Category::Role, target, now, tctx).is_some()
            {
                quarantined += 1;
            }
        }
        if let Some(testing) = testing {
            for &b in &outcome.newly_notified {
                testing.oblige(b);
            }
        }
        quarantined
    }

    /// Close the case of `index`, lifting its notices and dropping its records.
    pub fn resolve(&mut self, index: AgentId) {
        if let Some(notified) = self.cases.remove(&index) {
            for b in notified {
                if let Some(count) = self.notices.get_mut(&b) {
                    *count -= 1;
                    if *count == 0 {
                        self.notices.remove(&b);
                    }
                }
            }
        }
        self.contacts[index.index()].clear();
    }

    /// Close every active case whose index is no longer confirmed.
    pub fn resolve_closed(&mut self, states: &StatesManager) -> usize {
        let closed: Vec<AgentId> = self
            .active_cases()
            .into_iter()
            .filter(|&a| !states.has_in(a, Category::Testing, Trait::Confirmed))
            .collect();
        for &a in &closed {
            self.resolve(a);
        }
        closed.len()
    }

    /// Drop records older than the window.
    pub fn purge(&mut self, now: Tick, clock: &SimClock) {
        let window = self.params.window_days;
        for list in &mut self.contacts {
            while list.front().is_some_and(|c| clock.days_between(c.tick, now) > window) {
                list.pop_front();
            }
        }
    }
}
