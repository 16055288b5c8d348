//! Diagnostic testing: who gets tested, what the test says, and when the
//! result comes back.
//!
//! An agent is *eligible* once testing has started if it is alive, not
//! already awaiting a result or confirmed, and its last test is at least
//! `retest_interval_days` old.  Eligible agents are *selected* when they
//! carry a tracing obligation, present symptoms (with
//! `symptomatic_probability`) or are picked for surveillance (with
//! `random_probability`).  A `switch` replaces both probabilities from its
//! day on.  The testing category moves to `awaiting` immediately and to
//! `positive` / `negative` once the result delay has passed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use abm_core::{AgentId, AgentRng, Category, SimClock, StateValue, Tick};
use abm_states::{StatesManager, Trait};
use abm_transitions::{SeasonalFlu, TransitionCtx, TransitionsManager};

use crate::{InterventionError, InterventionResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestingStates {
    pub awaiting: String,
    pub positive: String,
    pub negative: String,
}

/// Selection probabilities that take over from `day` on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestingSwitch {
    pub day:                     f64,
    pub symptomatic_probability: f64,
    pub random_probability:      f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestingParams {
    #[serde(default)]
    pub start_day:               f64,
    #[serde(default)]
    pub symptomatic_probability: f64,
    #[serde(default)]
    pub random_probability:      f64,
    pub sensitivity:             f64,
    pub specificity:             f64,
    /// Chance an uninfected agent sick with flu tests positive.
    #[serde(default)]
    pub flu_false_positive:      f64,
    #[serde(default)]
    pub result_delay_days:       f64,
    #[serde(default)]
    pub retest_interval_days:    f64,
    #[serde(default)]
    pub switch:                  Option<TestingSwitch>,
    pub states:                  TestingStates,
}

impl TestingParams {
    pub fn validate(&self) -> InterventionResult<()> {
        let mut probs = vec![
            ("symptomatic_probability", self.symptomatic_probability),
            ("random_probability", self.random_probability),
            ("sensitivity", self.sensitivity),
            ("specificity", self.specificity),
            ("flu_false_positive", self.flu_false_positive),
        ];
        if let Some(sw) = &self.switch {
            if !(sw.day.is_finite() && sw.day >= 0.0) {
                return Err(InterventionError::config("testing", "switch.day must be non-negative"));
            }
            probs.push(("switch.symptomatic_probability", sw.symptomatic_probability));
            probs.push(("switch.random_probability", sw.random_probability));
        }
        for (name, p) in probs {
            if !(0.0..=1.0).contains(&p) {
                return Err(InterventionError::config("testing", format!("{name} {p} is not a probability")));
            }
        }
        for (name, d) in [("result_delay_days", self.result_delay_days), ("retest_interval_days", self.retest_interval_days)] {
            if !d.is_finite() || d < 0.0 {
                return Err(InterventionError::config("testing", format!("{name} must be non-negative")));
            }
        }
        Ok(())
    }
}

/// What a test says compared to the truth.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TestOutcome {
    TruePositive,
    FalseNegative,
    TrueNegative,
    FalsePositive,
}

impl TestOutcome {
    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, TestOutcome::TruePositive | TestOutcome::FalsePositive)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TestDecision {
    NotEligible,
    NotSelected,
    Tested { outcome: TestOutcome, result_due: Tick },
}

/// Cumulative counts per outcome.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TestingStats {
    pub tested:         u64,
    pub true_positive:  u64,
    pub false_negative: u64,
    pub true_negative:  u64,
    pub false_positive: u64,
}

impl TestingStats {
    fn count(&mut self, outcome: TestOutcome) {
        self.tested += 1;
        match outcome {
            TestOutcome::TruePositive  => self.true_positive += 1,
            TestOutcome::FalseNegative => self.false_negative += 1,
            TestOutcome::TrueNegative  => self.true_negative += 1,
            TestOutcome::FalsePositive => self.false_positive += 1,
        }
    }
}

/// This step's testing activity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestingStep {
    pub tested:    u32,
    /// Agents whose positive result was written this step, ascending.
    pub confirmed: Vec<AgentId>,
}

pub struct Testing {
    params:      TestingParams,
    awaiting:    StateValue,
    positive:    StateValue,
    negative:    StateValue,
    last_test:   Vec<Option<Tick>>,
    obligations: Vec<bool>,
    results:     BTreeMap<Tick, Vec<(AgentId, bool)>>,
    stats:       TestingStats,
}

impl Testing {
    pub fn new(params: TestingParams, states: &StatesManager) -> InterventionResult<Self> {
        params.validate()?;
        let taxonomy = states.taxonomy();
        let awaiting = taxonomy.require(Category::Testing, &params.states.awaiting)?;
        let positive = taxonomy.require(Category::Testing, &params.states.positive)?;
        let negative = taxonomy.require(Category::Testing, &params.states.negative)?;
        Ok(Self {
            params,
            awaiting,
            positive,
            negative,
            last_test: vec![None; states.len()],
            obligations: vec![false; states.len()],
            results: BTreeMap::new(),
            stats: TestingStats::default(),
        })
    }

    pub fn stats(&self) -> TestingStats {
        self.stats
    }

    /// Require `agent` to be tested at its next eligible step.
    pub fn oblige(&mut self, agent: AgentId) {
        self.obligations[agent.index()] = true;
    }

    pub fn is_obliged(&self, agent: AgentId) -> bool {
        self.obligations[agent.index()]
    }

    /// Results still on their way.
    pub fn pending_results(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    fn started(&self, clock: &SimClock, now: Tick) -> bool {
        clock.days_at(now) >= self.params.start_day
    }

    /// `(symptomatic, random)` selection probabilities in force at `now`.
    pub fn selection(&self, clock: &SimClock, now: Tick) -> (f64, f64) {
        match &self.params.switch {
            Some(sw) if clock.days_at(now) >= sw.day => (sw.symptomatic_probability, sw.random_probability),
            _ => (self.params.symptomatic_probability, self.params.random_probability),
        }
    }

    /// Decide whether `agent` is tested at `now` and what the result will be.
    /// Draws only from the agent's own RNG; changes nothing.
    pub fn evaluate(
        &self,
        agent:  AgentId,
        now:    Tick,
        states: &StatesManager,
        flu:    &SeasonalFlu,
        clock:  &SimClock,
        rng:    &mut AgentRng,
    ) -> TestDecision {
        if !self.started(clock, now)
            || states.has(agent, Trait::Dead)
            || states.has_in(agent, Category::Testing, Trait::Pending)
            || states.has_in(agent, Category::Testing, Trait::Confirmed)
        {
            return TestDecision::NotEligible;
        }
        if let Some(last) = self.last_test[agent.index()] {
            if clock.days_between(last, now) < self.params.retest_interval_days {
                return TestDecision::NotEligible;
            }
        }

        let (symptomatic, random) = self.selection(clock, now);
        let selected = if self.obligations[agent.index()] {
            true
        } else if flu.presents_symptoms(states, agent) {
            rng.gen_bool(symptomatic)
        } else {
            rng.gen_bool(random)
        };
        if !selected {
            return TestDecision::NotSelected;
        }

        let outcome = if states.has(agent, Trait::Infected) {
            if rng.gen_bool(self.params.sensitivity) {
                TestOutcome::TruePositive
            } else {
                TestOutcome::FalseNegative
            }
        } else {
            let p_false = if flu.is_sick(agent) {
                self.params.flu_false_positive
            } else {
                1.0 - self.params.specificity
            };
            if rng.gen_bool(p_false) {
                TestOutcome::FalsePositive
            } else {
                TestOutcome::TrueNegative
            }
        };

        let result_due = now.offset(clock.ticks_for_days(self.params.result_delay_days));
        TestDecision::Tested { outcome, result_due }
    }

    /// Test everyone selected this step, then write every result that has
    /// come due.
    pub fn step(
        &mut self,
        now:  Tick,
        tm:   &mut TransitionsManager,
        flu:  &SeasonalFlu,
        tctx: &mut TransitionCtx<'_>,
    ) -> TestingStep {
        let mut report = TestingStep::default();
        if !self.started(tctx.clock, now) {
            return report;
        }

        for agent in tctx.agents.agent_ids() {
            let decision =
                self.evaluate(agent, now, tm.states(), flu, tctx.clock, tctx.rngs.get_mut(agent));
            let TestDecision::Tested { outcome, result_due } = decision else { continue };
            if tm.transition(agent, Category::Testing, self.awaiting, now, tctx).is_none() {
                continue;
            }
            self.last_test[agent.index()] = Some(now);
            self.obligations[agent.index()] = false;
            self.stats.count(outcome);
            self.results.entry(result_due).or_default().push((agent, outcome.is_positive()));
            report.tested += 1;
        }

        let later = self.results.split_off(&now.offset(1));
        let due = std::mem::replace(&mut self.results, later);
        let mut arrived: Vec<(AgentId, bool)> = due.into_values().flatten().collect();
        arrived.sort_unstable_by_key(|&(a, _)| a);

        for (agent, positive) in arrived {
            let to = if positive { self.positive } else { self.negative };
            if tm.transition(agent, Category::Testing, to, now, tctx).is_some() && positive {
                report.confirmed.push(agent);
            }
        }

        log::debug!("{now}: {} tested, {} confirmed", report.tested, report.confirmed.len());
        report
    }
}
