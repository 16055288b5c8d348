//! Transition rules: where a category goes next and how long it takes.
//!
//! ```json
//! "transitions": {
//!   "regular": [
//!     { "category": "health", "from": "exposed",
//!       "branches": [
//!         { "to": "symptomatic",
//!           "probability": { "input": "age", "function": { "points": [[0,0.4],[20,0.5],[60,0.7],[100,0.8]] } } }
//!       ],
//!       "remainder": "recovered",
//!       "duration": { "dist": "log_normal", "mean": 5.2, "std": 2.8 } },
//!     { "category": "health", "from": "symptomatic",
//!       "branches": [ { "to": "dead", "probability": 0.01, "scale_by_severity": true } ],
//!       "remainder": "recovered",
//!       "duration": { "dist": "gamma", "shape": 4.0, "scale": 2.5 } }
//!   ],
//!   "hospital_employee": [ ... ],
//!   "category_priority": ["health", "testing", "role", "vaccination"]
//! }
//! ```
//!
//! A rule fires once per entry into its `from` state.  Branch probabilities
//! are evaluated at the time of entry; mass not claimed by a branch goes to
//! `remainder`, and with no remainder the agent simply stays.

use serde::{Deserialize, Serialize};

use rand_distr::{Exp, Gamma, LogNormal, Weibull};

use abm_core::{AgentId, AgentRng, AuditEvent, AuditLog, Category, CurveInputs, Param, StateValue, Tick};
use abm_population::AgentKind;
use abm_states::Taxonomy;

use crate::{TransitionError, TransitionResult};

// ── Specs (deserialized) ──────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BranchSpec {
    pub to:          String,
    pub probability: Param,
    /// Multiply the probability by the agent's vaccine severity multiplier.
    #[serde(default)]
    pub scale_by_severity: bool,
}

/// Time spent in the `from` state before the sampled transition fires, in
/// days.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "snake_case")]
pub enum DurationSpec {
    Fixed       { days: Param },
    Exponential { mean: Param },
    /// Parameterised by the mean and standard deviation of the duration
    /// itself, not of its logarithm.
    LogNormal   { mean: Param, std: Param },
    Gamma       { shape: Param, scale: Param },
    Weibull     { shape: Param, scale: Param },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleSpec {
    pub category: Category,
    pub from:     String,
    #[serde(default)]
    pub branches: Vec<BranchSpec>,
    #[serde(default)]
    pub remainder: Option<String>,
    pub duration: DurationSpec,
}

fn default_priority() -> Vec<Category> {
    vec![Category::Health, Category::Testing, Category::Role, Category::Vaccination]
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionsSpec {
    #[serde(default)]
    pub regular:           Vec<RuleSpec>,
    #[serde(default)]
    pub hospital_employee: Vec<RuleSpec>,
    #[serde(default)]
    pub hospital_patient:  Vec<RuleSpec>,
    /// Order in which same-tick transitions of one agent are applied.
    #[serde(default = "default_priority")]
    pub category_priority: Vec<Category>,
}

impl Default for TransitionsSpec {
    fn default() -> Self {
        Self {
            regular:           Vec::new(),
            hospital_employee: Vec::new(),
            hospital_patient:  Vec::new(),
            category_priority: default_priority(),
        }
    }
}

// ── ManagerKind ───────────────────────────────────────────────────────────────

/// Which rule set governs an agent.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ManagerKind {
    Regular,
    HospitalEmployee,
    HospitalPatient,
}

impl ManagerKind {
    pub const COUNT: usize = 3;

    pub fn for_kind(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Regular          => ManagerKind::Regular,
            AgentKind::HospitalEmployee => ManagerKind::HospitalEmployee,
            AgentKind::HospitalPatient  => ManagerKind::HospitalPatient,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ManagerKind::Regular          => "regular",
            ManagerKind::HospitalEmployee => "hospital_employee",
            ManagerKind::HospitalPatient  => "hospital_patient",
        }
    }
}

// ── Compiled rules ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub(crate) struct Branch {
    to:                StateValue,
    probability:       Param,
    scale_by_severity: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Rule {
    branches:  Vec<Branch>,
    remainder: Option<StateValue>,
    duration:  DurationSpec,
}

/// Per-agent inputs gathered once before sampling a rule.
pub(crate) struct Draw<'a> {
    pub agent:    AgentId,
    pub now:      Tick,
    pub inputs:   CurveInputs,
    pub severity: f64,
    pub audit:    &'a mut AuditLog,
}

impl Draw<'_> {
    /// Evaluate `p`, recording a clamp when the input fell outside the curve.
    fn eval(&mut self, p: &Param, what: &'static str) -> f64 {
        let e = p.eval(&self.inputs);
        if e.clamped {
            let input = match p {
                Param::Curve { input, .. } => self.inputs.get(*input),
                Param::Const(v) => *v,
            };
            self.audit.record(AuditEvent::DomainClamp {
                tick: self.now,
                agent: Some(self.agent),
                what,
                input,
                used: e.value,
            });
        }
        e.value
    }

    /// A probability forced into [0, 1].
    fn probability(&mut self, p: &Param, what: &'static str) -> f64 {
        let v = self.eval(p, what);
        let used = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        if used != v {
            self.audit.record(AuditEvent::DomainClamp {
                tick: self.now,
                agent: Some(self.agent),
                what,
                input: v,
                used,
            });
        }
        used
    }
}

impl Rule {
    /// Choose the next state, or `None` to stay.
    pub(crate) fn pick(&self, draw: &mut Draw<'_>, rng: &mut AgentRng) -> Option<StateValue> {
        let mut probs = Vec::with_capacity(self.branches.len());
        for b in &self.branches {
            let mut p = draw.probability(&b.probability, "transition probability");
            if b.scale_by_severity {
                p *= draw.severity.clamp(0.0, 1.0);
            }
            probs.push(p);
        }

        let total: f64 = probs.iter().sum();
        if total > 1.0 {
            draw.audit.record(AuditEvent::DomainClamp {
                tick: draw.now,
                agent: Some(draw.agent),
                what: "branch probability sum",
                input: total,
                used: 1.0,
            });
            for p in &mut probs {
                *p /= total;
            }
        }

        if self.branches.is_empty() {
            return self.remainder;
        }

        let u: f64 = rng.random();
        let mut acc = 0.0;
        for (b, p) in self.branches.iter().zip(&probs) {
            acc += p;
            if u < acc {
                return Some(b.to);
            }
        }
        self.remainder
    }

    /// Sampled time in state, in days.
    pub(crate) fn duration_days(&self, draw: &mut Draw<'_>, rng: &mut AgentRng) -> f64 {
        match &self.duration {
            DurationSpec::Fixed { days } => draw.eval(days, "duration"),
            DurationSpec::Exponential { mean } => {
                let mean = draw.eval(mean, "duration mean");
                match Exp::new(1.0 / mean) {
                    Ok(d) => rng.sample(&d),
                    Err(_) => mean,
                }
            }
            DurationSpec::LogNormal { mean, std } => {
                let mean = draw.eval(mean, "duration mean");
                let std = draw.eval(std, "duration std");
                let sigma2 = (1.0 + (std * std) / (mean * mean)).ln();
                let mu = mean.ln() - sigma2 / 2.0;
                match LogNormal::new(mu, sigma2.sqrt()) {
                    Ok(d) => rng.sample(&d),
                    Err(_) => mean,
                }
            }
            DurationSpec::Gamma { shape, scale } => {
                let shape = draw.eval(shape, "duration shape");
                let scale = draw.eval(scale, "duration scale");
                match Gamma::new(shape, scale) {
                    Ok(d) => rng.sample(&d),
                    Err(_) => shape * scale,
                }
            }
            DurationSpec::Weibull { shape, scale } => {
                let shape = draw.eval(shape, "duration shape");
                let scale = draw.eval(scale, "duration scale");
                match Weibull::new(scale, shape) {
                    Ok(d) => rng.sample(&d),
                    Err(_) => scale,
                }
            }
        }
    }
}

/// Rules of one manager kind, indexed by category then `from` value.
#[derive(Clone, Debug)]
pub(crate) struct RuleSet {
    by_state: [Vec<Option<Rule>>; Category::COUNT],
}

impl RuleSet {
    pub(crate) fn compile(
        taxonomy: &Taxonomy,
        specs:    &[RuleSpec],
        kind:     ManagerKind,
    ) -> TransitionResult<Self> {
        let mut by_state = Category::ALL.map(|c| vec![None; taxonomy.len(c)]);
        let variant = kind.name();
        let fail = |detail: String| TransitionError::Rule { variant, detail };

        for spec in specs {
            let c = spec.category;
            let from = taxonomy.require(c, &spec.from)?;
            if by_state[c.index()][from.index()].is_some() {
                return Err(fail(format!("two rules for {c} state {:?}", spec.from)));
            }
            if spec.branches.is_empty() && spec.remainder.is_none() {
                return Err(fail(format!("rule for {c} {:?} has no target", spec.from)));
            }

            let mut branches = Vec::with_capacity(spec.branches.len());
            for b in &spec.branches {
                let (lo, hi) = b.probability.range();
                if !(lo.is_finite() && hi.is_finite()) {
                    return Err(fail(format!("{c} {:?} -> {:?}: probability is not finite", spec.from, b.to)));
                }
                branches.push(Branch {
                    to:                taxonomy.require(c, &b.to)?,
                    probability:       b.probability.clone(),
                    scale_by_severity: b.scale_by_severity,
                });
            }
            let remainder = match &spec.remainder {
                Some(name) => Some(taxonomy.require(c, name)?),
                None => None,
            };
            check_duration(&spec.duration).map_err(|e| fail(format!("{c} {:?}: {e}", spec.from)))?;

            by_state[c.index()][from.index()] = Some(Rule {
                branches,
                remainder,
                duration: spec.duration.clone(),
            });
        }
        Ok(Self { by_state })
    }

    #[inline]
    pub(crate) fn get(&self, category: Category, from: StateValue) -> Option<&Rule> {
        self.by_state[category.index()]
            .get(from.index())
            .and_then(Option::as_ref)
    }
}

fn positive(p: &Param, what: &str) -> Result<(), String> {
    let (lo, hi) = p.range();
    if lo > 0.0 && hi.is_finite() {
        Ok(())
    } else {
        Err(format!("{what} must be positive and finite"))
    }
}

fn check_duration(d: &DurationSpec) -> Result<(), String> {
    match d {
        DurationSpec::Fixed { days } => {
            let (lo, hi) = days.range();
            if lo >= 0.0 && hi.is_finite() { Ok(()) } else { Err("fixed days must be non-negative".into()) }
        }
        DurationSpec::Exponential { mean } => positive(mean, "exponential mean"),
        DurationSpec::LogNormal { mean, std } => {
            positive(mean, "log-normal mean")?;
            let (lo, hi) = std.range();
            if lo >= 0.0 && hi.is_finite() { Ok(()) } else { Err("log-normal std must be non-negative".into()) }
        }
        DurationSpec::Gamma { shape, scale } | DurationSpec::Weibull { shape, scale } => {
            positive(shape, "shape")?;
            positive(scale, "scale")
        }
    }
}

/// `category_priority` as a rank per category (lower applies first).
pub(crate) fn priority_ranks(order: &[Category]) -> TransitionResult<[u8; Category::COUNT]> {
    let mut ranks = [u8::MAX; Category::COUNT];
    for (rank, &c) in order.iter().enumerate() {
        if ranks[c.index()] != u8::MAX {
            return Err(TransitionError::Config(format!("category_priority lists {c} twice")));
        }
        ranks[c.index()] = rank as u8;
    }
    if let Some(missing) = Category::ALL.iter().find(|c| ranks[c.index()] == u8::MAX) {
        return Err(TransitionError::Config(format!("category_priority is missing {missing}")));
    }
    Ok(ranks)
}
