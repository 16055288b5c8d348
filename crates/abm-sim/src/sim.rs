//! The `Sim` struct and its step pipeline.

use abm_core::{AuditLog, SimClock, SimConfig, SimRng, Tick};
use abm_infection::InfectionModel;
use abm_interventions::{ContactTracing, Testing, TestingStep, Vaccination, VaccinationCtx};
use abm_mobility::{Mobility, MobilityCtx, Occupancy};
use abm_population::{AgentRngs, AgentStore, PlaceStore};
use abm_transitions::{SeasonalFlu, TransitionCtx, TransitionsManager};

use crate::{RunReport, SimObserver, SimResult, StepSnapshot, Timeline};

/// Split borrow of the fields every state write needs.
macro_rules! tctx {
    ($sim:ident) => {
        TransitionCtx {
            agents: &$sim.agents,
            rngs:   &mut $sim.rngs,
            clock:  &$sim.clock,
            audit:  &mut $sim.audit,
        }
    };
}

/// Running totals behind the [`RunReport`].
#[derive(Clone, Debug, Default)]
pub(crate) struct Totals {
    pub infections: u64,
    pub tests:      u64,
    pub confirmed:  u64,
    pub doses:      u64,
    pub traced:     u64,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Every step runs the same fixed pipeline:
///
/// 0. **Events**: scheduled closures and phases, leisure reopening.
/// 1. **Mobility**: rebuild the step's occupancy.
/// 2. **Infection**: place exposure and per-agent draws.
/// 3. **Transitions**: apply due transitions, then the seasonal-flu overlay.
/// 4. **Testing**: new tests and results coming due.
/// 5. **Vaccination**: this step's doses.
/// 6. **Contact tracing**: record contacts, trace this step's confirmed cases.
/// 7. **Snapshot**, then the clock advances.
///
/// State writes are applied sequentially in ascending agent id within each
/// stage, so results depend only on parameters and seed.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config:      SimConfig,
    pub clock:       SimClock,
    pub agents:      AgentStore,
    pub rngs:        AgentRngs,
    pub places:      PlaceStore,

    /// Owns the composite state; the only write path.
    pub transitions: TransitionsManager,
    pub flu:         SeasonalFlu,
    pub mobility:    Mobility,
    pub infection:   InfectionModel,
    pub testing:     Option<Testing>,
    pub vaccination: Option<Vaccination>,
    pub tracing:     Option<ContactTracing>,
    pub timeline:    Timeline,

    /// Where everyone was during the last step.
    pub occupancy:   Occupancy,
    pub audit:       AuditLog,

    pub(crate) flu_rng:     SimRng,
    pub(crate) tracing_rng: SimRng,
    pub(crate) totals:      Totals,
    pub(crate) ticks_run:   u64,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunReport> {
        log::info!(
            "running {} agents, {} places from {} to {}",
            self.agents.count,
            self.places.len(),
            self.clock.current_tick,
            self.config.end_tick()
        );
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer)?;
        }
        let report = self.report();
        report.log();
        observer.on_sim_end(self.clock.current_tick, &report);
        Ok(report)
    }

    /// Run exactly `n` steps from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    /// Run one step of the pipeline, emit its snapshot and advance the clock.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<StepSnapshot> {
        let now = self.clock.current_tick;
        observer.on_step_start(now);

        // ── ⓪ Events ─────────────────────────────────────────────────────
        self.timeline.apply(self.clock.days_at(now), &mut self.infection, &mut self.mobility);

        // ── ① Mobility ────────────────────────────────────────────────────
        {
            let ctx = MobilityCtx {
                agents: &self.agents,
                places: &self.places,
                states: self.transitions.states(),
                flu:    &self.flu,
            };
            self.mobility.place_all(now, &ctx, &mut self.rngs, &mut self.audit, &mut self.occupancy)?;
        }

        // ── ② Infection ───────────────────────────────────────────────────
        let infected = self.infection.step(now, &self.occupancy, &mut self.transitions, &mut tctx!(self));
        self.totals.infections += infected.len() as u64;

        // ── ③ Transitions and seasonal flu ────────────────────────────────
        let transitions = self.transitions.advance(now, &mut tctx!(self));
        self.flu.step(now, &self.clock, self.transitions.states(), &self.agents, &mut self.flu_rng);

        // ── ④ Testing ─────────────────────────────────────────────────────
        let tested = match &mut self.testing {
            Some(testing) => testing.step(now, &mut self.transitions, &self.flu, &mut tctx!(self)),
            None => TestingStep::default(),
        };
        self.totals.tests += u64::from(tested.tested);
        self.totals.confirmed += tested.confirmed.len() as u64;

        // ── ⑤ Vaccination ─────────────────────────────────────────────────
        let doses = match &mut self.vaccination {
            Some(campaign) => {
                let mut ctx = VaccinationCtx {
                    agents: &mut self.agents,
                    places: &self.places,
                    rngs:   &mut self.rngs,
                    clock:  &self.clock,
                    audit:  &mut self.audit,
                    flu:    &self.flu,
                };
                campaign.step(now, &mut self.transitions, &mut ctx)?
            }
            None => 0,
        };
        self.totals.doses += u64::from(doses);

        // ── ⑥ Contact tracing ─────────────────────────────────────────────
        let mut traced = 0u32;
        if let Some(tracing) = &mut self.tracing {
            tracing.resolve_closed(self.transitions.states());
            tracing.purge(now, &self.clock);
            tracing.record(&self.occupancy, now, &self.places, &mut self.tracing_rng);
            for &index in &tested.confirmed {
                let outcome =
                    tracing.trace(index, now, self.transitions.states(), &self.clock, &mut self.tracing_rng);
                traced += outcome.newly_notified.len() as u32;
                tracing.notify(&outcome, now, &mut self.transitions, self.testing.as_mut(), &mut tctx!(self));
            }
        }
        self.totals.traced += u64::from(traced);

        // ── ⑦ Snapshot ────────────────────────────────────────────────────
        let states = self.transitions.states();
        let snapshot = StepSnapshot {
            tick:                  now,
            day:                   self.clock.now_days(),
            counts:                StepSnapshot::counts_of(states),
            new_infections:        infected.len() as u32,
            cumulative_infections: self.totals.infections,
            transitions:           transitions as u32,
            flu_sick:              self.flu.sick_count() as u32,
            tests:                 tested.tested,
            new_confirmed:         tested.confirmed.len() as u32,
            doses,
            traced,
            rerouted:              self.occupancy.rerouted,
            fell_back:             self.occupancy.fell_back,
        };
        log::debug!(
            "{now}: {} new infections, {} transitions, {} tests, {} doses, {} traced",
            snapshot.new_infections,
            snapshot.transitions,
            snapshot.tests,
            snapshot.doses,
            snapshot.traced
        );
        observer.on_step_end(&snapshot, states);
        let interval = self.config.output_interval_ticks;
        if interval > 0 && now.0 % interval == 0 {
            observer.on_snapshot(now, states, &self.agents);
        }

        self.clock.advance();
        self.ticks_run += 1;
        Ok(snapshot)
    }

    /// Summary of everything run so far.
    pub fn report(&self) -> RunReport {
        RunReport {
            ticks_run:             self.ticks_run,
            final_tick:            self.clock.current_tick,
            cumulative_infections: self.totals.infections,
            tests:                 self.totals.tests,
            confirmed:             self.totals.confirmed,
            doses:                 self.totals.doses,
            traced:                self.totals.traced,
            ..RunReport::default()
        }
        .with_audit(&self.audit)
    }

    /// The tick the next step will simulate.
    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }
}
