//! Vaccination campaign: who gets a dose, which product, and the protection
//! it confers over time.
//!
//! Product curves are authored in days since the dose and installed shifted
//! to the dose day.  A booster replaces them with a ramp from the protection
//! held at boosting time up to the product's peak, a plateau, and a wane
//! back to zero:
//!
//! Agents vaccinated before the run starts are seeded by
//! [`Vaccination::seed_initial`] with their dose back-dated by a random
//! number of days, so the population enters the run with protection at
//! every stage of its curve.
//!
//! ```text
//!  peak ┤      ┌──────────┐
//!       │     /            \
//!  now  ┤────/              \
//!     0 ┤                    \──────
//!       └────┴─────┴──────────┴─────▶ days
//!           t0   +ramp    +plateau  +waning
//! ```

use serde::{Deserialize, Serialize};

use abm_core::{AgentId, AuditLog, Category, Interpolation, PlaceId, ProductId, SimClock, SimRng, StateValue, Tick, TransitionFunction};
use abm_population::{AgentKind, AgentRngs, AgentStore, PlaceKind, PlaceStore, Protection};
use abm_states::{StatesManager, Trait};
use abm_transitions::{SeasonalFlu, TransitionCtx, TransitionsManager};

use crate::{InterventionError, InterventionResult};

// ── Parameters ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductSpec {
    pub name:           String,
    /// Relative share of doses; normalised over all products.
    pub share:          f64,
    pub susceptibility: TransitionFunction,
    pub transmission:   TransitionFunction,
    pub severity:       TransitionFunction,
}

/// One priority tier.  Every set field must match; an empty group matches
/// everyone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PriorityGroup {
    #[serde(default)]
    pub kind:      Option<AgentKind>,
    #[serde(default)]
    pub min_age:   Option<u8>,
    #[serde(default)]
    pub max_age:   Option<u8>,
    /// Kind of the agent's work place.
    #[serde(default)]
    pub work_kind: Option<PlaceKind>,
    /// Kind of the agent's residence.
    #[serde(default)]
    pub residence: Option<PlaceKind>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoosterParams {
    /// Days after the previous dose before a booster is allowed.
    pub after_days:   f64,
    /// Boosters per agent.
    pub max:          u8,
    pub state:        String,
    pub ramp_days:    f64,
    pub plateau_days: f64,
    pub waning_days:  f64,
}

/// Agents already vaccinated when the run starts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitialVaccinations {
    pub count:       u32,
    /// `[earliest, latest]` days before the start the dose was given,
    /// drawn uniformly per agent.
    pub offset_days: [f64; 2],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaccinationParams {
    #[serde(default)]
    pub start_day:      f64,
    pub doses_per_step: u32,
    pub max_total:      u64,
    #[serde(default)]
    pub min_age:        u8,
    /// Highest priority first; agents matching no group come last.
    #[serde(default)]
    pub priority:       Vec<PriorityGroup>,
    pub products:       Vec<ProductSpec>,
    pub dose_state:     String,
    #[serde(default)]
    pub booster:        Option<BoosterParams>,
    #[serde(default)]
    pub initial:        Option<InitialVaccinations>,
}

// ── Campaign ──────────────────────────────────────────────────────────────────

/// Mutable world state a dosing step writes to.
pub struct VaccinationCtx<'a> {
    pub agents: &'a mut AgentStore,
    pub places: &'a PlaceStore,
    pub rngs:   &'a mut AgentRngs,
    pub clock:  &'a SimClock,
    pub audit:  &'a mut AuditLog,
    pub flu:    &'a SeasonalFlu,
}

pub struct Vaccination {
    params:        VaccinationParams,
    dose_state:    StateValue,
    booster_state: Option<StateValue>,
    cumulative:    f64,
    given:         u64,
    rng:           SimRng,
}

impl Vaccination {
    pub fn new(params: VaccinationParams, states: &StatesManager, rng: SimRng) -> InterventionResult<Self> {
        let fail = |d: String| InterventionError::config("vaccination", d);
        if params.products.is_empty() {
            return Err(fail("at least one product is required".into()));
        }
        if params.products.iter().any(|p| !p.share.is_finite() || p.share < 0.0) {
            return Err(fail("product shares must be non-negative".into()));
        }
        let cumulative: f64 = params.products.iter().map(|p| p.share).sum();
        if cumulative <= 0.0 {
            return Err(fail("product shares sum to zero".into()));
        }
        if params.products.len() > u16::MAX as usize {
            return Err(fail("too many products".into()));
        }
        let taxonomy = states.taxonomy();
        let dose_state = taxonomy.require(Category::Vaccination, &params.dose_state)?;
        let booster_state = match &params.booster {
            Some(b) => {
                if !(b.ramp_days > 0.0 && b.plateau_days > 0.0 && b.waning_days > 0.0) {
                    return Err(fail("booster ramp, plateau and waning must be positive".into()));
                }
                if !(b.after_days.is_finite() && b.after_days >= 0.0) {
                    return Err(fail("booster after_days must be non-negative".into()));
                }
                Some(taxonomy.require(Category::Vaccination, &b.state)?)
            }
            None => None,
        };
        if let Some(init) = &params.initial {
            let [earliest, latest] = init.offset_days;
            if !(earliest.is_finite() && latest.is_finite() && 0.0 <= earliest && earliest <= latest) {
                return Err(fail(format!(
                    "initial offset_days [{earliest}, {latest}] must be non-negative and ordered"
                )));
            }
        }
        Ok(Self { params, dose_state, booster_state, cumulative, given: 0, rng })
    }

    /// Doses given so far.
    pub fn given(&self) -> u64 {
        self.given
    }

    fn group_of(&self, agents: &AgentStore, places: &PlaceStore, agent: AgentId) -> usize {
        let i = agent.index();
        let kind_of = |p: PlaceId| if p.is_valid() { Some(places.kind(p)) } else { None };
        self.params
            .priority
            .iter()
            .position(|g| {
                g.kind.is_none_or(|k| k == agents.kind[i])
                    && g.min_age.is_none_or(|a| agents.age[i] >= a)
                    && g.max_age.is_none_or(|a| agents.age[i] <= a)
                    && g.work_kind.is_none_or(|k| kind_of(agents.work[i]) == Some(k))
                    && g.residence.is_none_or(|k| kind_of(agents.home(agent)) == Some(k))
            })
            .unwrap_or(self.params.priority.len())
    }

    /// First dose or booster?  `None` when not eligible at all.
    fn eligibility(
        &self,
        agent:  AgentId,
        day:    f64,
        agents: &AgentStore,
        states: &StatesManager,
        flu:    &SeasonalFlu,
    ) -> Option<bool> {
        let i = agent.index();
        if states.has(agent, Trait::Dead)
            || agents.age[i] < self.params.min_age
            || states.has_in(agent, Category::Testing, Trait::Pending)
            || states.has_in(agent, Category::Testing, Trait::Confirmed)
            || flu.presents_symptoms(states, agent)
            || states.has(agent, Trait::Isolated)
        {
            return None;
        }
        match &agents.protection[i] {
            None => Some(false),
            Some(p) => {
                let b = self.params.booster.as_ref()?;
                let boosters = p.doses.saturating_sub(1);
                (boosters < b.max && day - p.dosed_at_days >= b.after_days).then_some(true)
            }
        }
    }

    fn pick_product(&mut self) -> usize {
        let mut u = self.rng.random::<f64>() * self.cumulative;
        for (k, p) in self.params.products.iter().enumerate() {
            if u < p.share {
                return k;
            }
            u -= p.share;
        }
        self.params.products.len() - 1
    }

    fn first_dose(&self, product: usize, day: f64) -> Protection {
        let p = &self.params.products[product];
        Protection {
            product:        ProductId(product as u16),
            doses:          1,
            dosed_at_days:  day,
            susceptibility: p.susceptibility.shifted(day),
            transmission:   p.transmission.shifted(day),
            severity:       p.severity.shifted(day),
        }
    }

    fn boosted(&self, prev: &Protection, day: f64) -> InterventionResult<Protection> {
        let product = &self.params.products[prev.product.index()];
        let Some(b) = &self.params.booster else {
            return Err(InterventionError::config("vaccination", "no booster configured"));
        };
        let ramp = |current: &TransitionFunction, target: &TransitionFunction| {
            let now = current.value_at(day);
            let peak = target.peak();
            TransitionFunction::new(
                vec![
                    (day, now),
                    (day + b.ramp_days, peak),
                    (day + b.ramp_days + b.plateau_days, peak),
                    (day + b.ramp_days + b.plateau_days + b.waning_days, 0.0),
                ],
                Interpolation::Linear,
            )
        };
        Ok(Protection {
            product:        prev.product,
            doses:          prev.doses.saturating_add(1),
            dosed_at_days:  day,
            susceptibility: ramp(&prev.susceptibility, &product.susceptibility)?,
            transmission:   ramp(&prev.transmission, &product.transmission)?,
            severity:       ramp(&prev.severity, &product.severity)?,
        })
    }

    /// Vaccinate `initial.count` random eligible agents at `now`, each with
    /// its dose back-dated by a uniform draw from `initial.offset_days`.
    /// Counts toward `max_total`; ignores `start_day`, `doses_per_step` and
    /// priority groups.  Returns the number vaccinated.
    pub fn seed_initial(
        &mut self,
        now: Tick,
        tm:  &mut TransitionsManager,
        ctx: &mut VaccinationCtx<'_>,
    ) -> InterventionResult<u32> {
        let Some(init) = self.params.initial.clone() else { return Ok(0) };
        let day = ctx.clock.days_at(now);
        let mut pool: Vec<AgentId> = ctx
            .agents
            .agent_ids()
            .filter(|&a| self.eligibility(a, day, ctx.agents, tm.states(), ctx.flu) == Some(false))
            .collect();
        let wanted = u64::from(init.count).min(self.params.max_total.saturating_sub(self.given)) as usize;
        if wanted > pool.len() {
            log::warn!(
                "{} initial vaccinations requested but only {} agents are eligible",
                init.count,
                pool.len()
            );
        }
        self.rng.shuffle(&mut pool);
        pool.truncate(wanted);
        pool.sort_unstable();

        let [earliest, latest] = init.offset_days;
        let mut doses = 0u32;
        for agent in pool {
            let product = self.pick_product();
            let dosed_at = day - self.rng.gen_range(earliest..=latest);
            let protection = self.first_dose(product, dosed_at);
            let mut tctx = TransitionCtx {
                agents: &*ctx.agents,
                rngs:   &mut *ctx.rngs,
                clock:  ctx.clock,
                audit:  &mut *ctx.audit,
            };
            if tm.transition(agent, Category::Vaccination, self.dose_state, now, &mut tctx).is_some() {
                ctx.agents.protection[agent.index()] = Some(protection);
                doses += 1;
            }
        }

        self.given += u64::from(doses);
        log::info!("{doses} agents start the run vaccinated");
        Ok(doses)
    }

    /// Give this step's doses.  Returns the number given.
    pub fn step(
        &mut self,
        now: Tick,
        tm:  &mut TransitionsManager,
        ctx: &mut VaccinationCtx<'_>,
    ) -> InterventionResult<u32> {
        let day = ctx.clock.days_at(now);
        if day < self.params.start_day || self.given >= self.params.max_total {
            return Ok(0);
        }
        let budget = u64::from(self.params.doses_per_step).min(self.params.max_total - self.given) as usize;
        if budget == 0 {
            return Ok(0);
        }

        let mut tiers: Vec<Vec<(AgentId, bool)>> = vec![Vec::new(); self.params.priority.len() + 1];
        for agent in ctx.agents.agent_ids() {
            if let Some(booster) = self.eligibility(agent, day, ctx.agents, tm.states(), ctx.flu) {
                tiers[self.group_of(ctx.agents, ctx.places, agent)].push((agent, booster));
            }
        }
        let mut queue = Vec::with_capacity(budget);
        for tier in &mut tiers {
            if queue.len() >= budget {
                break;
            }
            self.rng.shuffle(tier);
            queue.extend(tier.iter().take(budget - queue.len()).copied());
        }
        queue.sort_unstable_by_key(|&(a, _)| a);

        let mut doses = 0u32;
        for (agent, booster) in queue {
            let i = agent.index();
            let (protection, target) = match (&ctx.agents.protection[i], booster) {
                (Some(prev), true) => match self.booster_state {
                    Some(s) => (self.boosted(prev, day)?, s),
                    None => continue,
                },
                _ => {
                    let product = self.pick_product();
                    (self.first_dose(product, day), self.dose_state)
                }
            };

            let written = tm.states().current(agent, Category::Vaccination) == target || {
                let mut tctx = TransitionCtx {
                    agents: &*ctx.agents,
                    rngs:   &mut *ctx.rngs,
                    clock:  ctx.clock,
                    audit:  &mut *ctx.audit,
                };
                tm.transition(agent, Category::Vaccination, target, now, &mut tctx).is_some()
            };
            if written {
                ctx.agents.protection[i] = Some(protection);
                doses += 1;
            }
        }

        self.given += u64::from(doses);
        log::debug!("{now}: {doses} vaccine doses ({} total)", self.given);
        Ok(doses)
    }
}
