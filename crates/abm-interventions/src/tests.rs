//! Unit tests for abm-interventions.

#[cfg(test)]
mod fixture {
    use abm_core::{AgentId, AuditLog, Category, PlaceId, SimClock, SimRng, Tick};
    use abm_mobility::Occupancy;
    use abm_population::{AgentKind, AgentRecord, InitialStates, Place, PlaceKind, Population, PopulationBuilder};
    use abm_states::{StatesManager, StatesSpec, Taxonomy, TaxonomySpec};
    use abm_transitions::{SeasonalFlu, TransitionCtx, TransitionsManager, TransitionsSpec};

    use crate::{Testing, TestingParams, TestingStep, Vaccination, VaccinationCtx, VaccinationParams};

    const TAXONOMY: &str = r#"{
        "health": { "initial": "susceptible", "states": [
            { "name": "susceptible",  "traits": ["susceptible"] },
            { "name": "infected",     "traits": ["infected", "infectious"], "infectiousness": 1.0 },
            { "name": "hospitalized", "traits": ["infected", "hospitalized"] },
            { "name": "dead",         "traits": ["dead"] }
        ]},
        "role": { "initial": "active", "states": [
            { "name": "active" },
            { "name": "isolated",    "traits": ["isolated"] },
            { "name": "quarantined", "traits": ["isolated"] },
            { "name": "on_leave",    "traits": ["isolated"] }
        ]},
        "testing": { "initial": "untested", "states": [
            { "name": "untested" },
            { "name": "awaiting", "traits": ["pending"] },
            { "name": "positive", "traits": ["confirmed"] },
            { "name": "negative" }
        ]},
        "vaccination": { "initial": "none", "states": [
            { "name": "none" },
            { "name": "vaccinated", "traits": ["vaccinated"] },
            { "name": "boosted",    "traits": ["vaccinated"] }
        ]}
    }"#;

    const STATES: &str = r#"{
        "regular": {
            "edges": {
                "role":    [["active", "isolated"], ["active", "quarantined"], ["quarantined", "active"]],
                "testing": [["untested", "awaiting"], ["awaiting", "positive"],
                            ["awaiting", "negative"], ["negative", "awaiting"],
                            ["positive", "awaiting"]],
                "vaccination": [["none", "vaccinated"], ["vaccinated", "boosted"]]
            },
            "coupling": [
                { "when": { "category": "testing", "state": "positive" },
                  "then": { "category": "role", "state": "isolated" },
                  "from": ["active"] }
            ]
        },
        "hospital_employee": {
            "edges": {
                "role":    [["active", "on_leave"]],
                "testing": [["untested", "awaiting"], ["awaiting", "positive"], ["awaiting", "negative"]]
            }
        }
    }"#;

    pub const TESTING: &str = r#"{
        "random_probability": 1.0,
        "sensitivity": 1.0,
        "specificity": 1.0,
        "states": { "awaiting": "awaiting", "positive": "positive", "negative": "negative" }
    }"#;

    pub const VACCINATION: &str = r#"{
        "doses_per_step": 100,
        "max_total": 1000,
        "dose_state": "vaccinated",
        "products": [ {
            "name": "mrna",
            "share": 1.0,
            "susceptibility": { "points": [[0, 0], [14, 0.9], [180, 0.9], [365, 0]] },
            "transmission":   { "points": [[0, 0], [14, 0.5], [180, 0.5], [365, 0]] },
            "severity":       { "points": [[0, 0], [14, 0.8], [180, 0.8], [365, 0]] }
        } ]
    }"#;

    pub struct World {
        pub pop:   Population,
        pub tm:    TransitionsManager,
        pub flu:   SeasonalFlu,
        pub clock: SimClock,
        pub audit: AuditLog,
    }

    pub fn agent(age: u8, initial: InitialStates) -> AgentRecord {
        AgentRecord { age, household: Some(0), initial, ..Default::default() }
    }

    pub fn employee(initial: InitialStates) -> AgentRecord {
        AgentRecord { kind: AgentKind::HospitalEmployee, ..agent(40, initial) }
    }

    /// Everyone lives in household 0; one-day steps.
    pub fn world(agents: Vec<AgentRecord>) -> World {
        let places = vec![Place {
            id:           PlaceId(0),
            kind:         PlaceKind::Household,
            capacity:     agents.len() as u32,
            transmission: None,
        }];
        let pop = PopulationBuilder::new(3).places(places).agents(agents).build().unwrap();
        let tax: TaxonomySpec = serde_json::from_str(TAXONOMY).unwrap();
        let spec: StatesSpec = serde_json::from_str(STATES).unwrap();
        let states =
            StatesManager::new(Taxonomy::from_spec(&tax).unwrap(), &spec, &pop.agents, &pop.initial)
                .unwrap();
        let tm = TransitionsManager::new(states, &TransitionsSpec::default(), &pop.agents).unwrap();
        World {
            flu: SeasonalFlu::disabled(pop.agents.count),
            pop,
            tm,
            clock: SimClock::new(1.0),
            audit: AuditLog::new(),
        }
    }

    pub fn uniform(n: usize, initial: InitialStates) -> World {
        world((0..n).map(|_| agent(40, initial.clone())).collect())
    }

    pub fn healthy(n: usize) -> World {
        uniform(n, InitialStates::default())
    }

    pub fn infected(n: usize) -> World {
        uniform(n, InitialStates::default().with(Category::Health, "infected"))
    }

    /// `TESTING` with some fields replaced.
    pub fn testing_params(patch: &[(&str, f64)]) -> TestingParams {
        let mut value: serde_json::Value = serde_json::from_str(TESTING).unwrap();
        for &(k, v) in patch {
            value[k] = serde_json::json!(v);
        }
        serde_json::from_value(value).unwrap()
    }

    pub fn vaccination_params(patch: serde_json::Value) -> VaccinationParams {
        let mut value: serde_json::Value = serde_json::from_str(VACCINATION).unwrap();
        if let (Some(base), Some(extra)) = (value.as_object_mut(), patch.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(value).unwrap()
    }

    impl World {
        /// Write `name` into `category` for `agent` through the manager.
        pub fn set(&mut self, agent: AgentId, category: Category, name: &str, now: u64) -> bool {
            let to = self.tm.states().taxonomy().require(category, name).unwrap();
            let mut tctx = TransitionCtx {
                agents: &self.pop.agents,
                rngs:   &mut self.pop.rngs,
                clock:  &self.clock,
                audit:  &mut self.audit,
            };
            self.tm.transition(agent, category, to, Tick(now), &mut tctx).is_some()
        }

        pub fn testing(&self, params: TestingParams) -> Testing {
            Testing::new(params, self.tm.states()).unwrap()
        }

        pub fn test_step(&mut self, testing: &mut Testing, now: u64) -> TestingStep {
            let mut tctx = TransitionCtx {
                agents: &self.pop.agents,
                rngs:   &mut self.pop.rngs,
                clock:  &self.clock,
                audit:  &mut self.audit,
            };
            testing.step(Tick(now), &mut self.tm, &self.flu, &mut tctx)
        }

        pub fn vaccination(&self, params: VaccinationParams) -> Vaccination {
            Vaccination::new(params, self.tm.states(), SimRng::new(5)).unwrap()
        }

        pub fn vaccinate(&mut self, campaign: &mut Vaccination, now: u64) -> u32 {
            let mut ctx = VaccinationCtx {
                agents: &mut self.pop.agents,
                places: &self.pop.places,
                rngs:   &mut self.pop.rngs,
                clock:  &self.clock,
                audit:  &mut self.audit,
                flu:    &self.flu,
            };
            campaign.step(Tick(now), &mut self.tm, &mut ctx).unwrap()
        }

        pub fn seed_vaccinations(&mut self, campaign: &mut Vaccination) -> u32 {
            let mut ctx = VaccinationCtx {
                agents: &mut self.pop.agents,
                places: &self.pop.places,
                rngs:   &mut self.pop.rngs,
                clock:  &self.clock,
                audit:  &mut self.audit,
                flu:    &self.flu,
            };
            campaign.seed_initial(Tick(0), &mut self.tm, &mut ctx).unwrap()
        }

        /// Everyone co-present in household 0.
        pub fn gathered(&self) -> Occupancy {
            let mut occ = Occupancy::new(&self.pop.places, self.pop.agents.count);
            for a in self.pop.agents.agent_ids() {
                occ.admit(PlaceId(0), a).unwrap();
            }
            occ
        }
    }
}

#[cfg(test)]
mod testing {
    use abm_core::{AgentId, Category, SimRng, Tick};
    use abm_transitions::{FluParams, SeasonalFlu};

    use super::fixture;
    use crate::{InterventionError, TestDecision, Testing};

    #[test]
    fn false_negative_rate_tracks_sensitivity() {
        let mut w = fixture::infected(4000);
        let mut testing = w.testing(fixture::testing_params(&[("sensitivity", 0.8)]));
        let step = w.test_step(&mut testing, 0);
        let stats = testing.stats();
        assert_eq!(step.tested, 4000);
        assert_eq!(stats.tested, 4000);
        assert_eq!(stats.true_positive + stats.false_negative, 4000);
        let rate = stats.false_negative as f64 / stats.tested as f64;
        assert!((rate - 0.2).abs() < 0.03, "false-negative rate {rate}");
        assert_eq!(step.confirmed.len() as u64, stats.true_positive);
    }

    #[test]
    fn positive_result_isolates() {
        let mut w = fixture::infected(3);
        let mut testing = w.testing(fixture::testing_params(&[]));
        let step = w.test_step(&mut testing, 0);
        assert_eq!(step.confirmed, vec![AgentId(0), AgentId(1), AgentId(2)]);
        for a in 0..3 {
            assert_eq!(w.tm.states().name_of(AgentId(a), Category::Testing), "positive");
            assert_eq!(w.tm.states().name_of(AgentId(a), Category::Role), "isolated");
        }
    }

    #[test]
    fn results_arrive_after_delay() {
        let mut w = fixture::infected(1);
        let mut testing = w.testing(fixture::testing_params(&[("result_delay_days", 2.0)]));
        assert_eq!(w.test_step(&mut testing, 0).tested, 1);
        assert_eq!(w.tm.states().name_of(AgentId(0), Category::Testing), "awaiting");
        assert_eq!(testing.pending_results(), 1);

        let step = w.test_step(&mut testing, 1);
        assert_eq!(step.tested, 0);
        assert!(step.confirmed.is_empty());

        let step = w.test_step(&mut testing, 2);
        assert_eq!(step.confirmed, vec![AgentId(0)]);
        assert_eq!(testing.pending_results(), 0);
        assert_eq!(w.tm.states().name_of(AgentId(0), Category::Testing), "positive");
    }

    #[test]
    fn retest_waits_for_interval() {
        let mut w = fixture::healthy(1);
        let mut testing = w.testing(fixture::testing_params(&[("retest_interval_days", 3.0)]));
        assert_eq!(w.test_step(&mut testing, 0).tested, 1);
        assert_eq!(w.tm.states().name_of(AgentId(0), Category::Testing), "negative");
        assert_eq!(w.test_step(&mut testing, 1).tested, 0);
        assert_eq!(w.test_step(&mut testing, 2).tested, 0);
        assert_eq!(w.test_step(&mut testing, 3).tested, 1);
        assert_eq!(testing.stats().true_negative, 2);
    }

    #[test]
    fn obligation_bypasses_selection() {
        let mut w = fixture::healthy(4);
        let mut testing = w.testing(fixture::testing_params(&[("random_probability", 0.0)]));
        testing.oblige(AgentId(2));
        assert!(testing.is_obliged(AgentId(2)));
        assert_eq!(w.test_step(&mut testing, 0).tested, 1);
        assert!(!testing.is_obliged(AgentId(2)));
        assert_eq!(w.tm.states().name_of(AgentId(2), Category::Testing), "negative");
        assert_eq!(w.tm.states().name_of(AgentId(0), Category::Testing), "untested");
    }

    #[test]
    fn nothing_before_start_day() {
        let mut w = fixture::infected(2);
        let mut testing = w.testing(fixture::testing_params(&[("start_day", 5.0)]));
        let decision = testing.evaluate(
            AgentId(0),
            Tick(0),
            w.tm.states(),
            &w.flu,
            &w.clock,
            w.pop.rngs.get_mut(AgentId(0)),
        );
        assert_eq!(decision, TestDecision::NotEligible);
        assert_eq!(w.test_step(&mut testing, 4).tested, 0);
        assert_eq!(w.test_step(&mut testing, 5).tested, 2);
    }

    #[test]
    fn switch_replaces_selection_probabilities() {
        let mut w = fixture::healthy(5);
        let mut value: serde_json::Value = serde_json::from_str(fixture::TESTING).unwrap();
        value["switch"] = serde_json::json!({
            "day": 3.0, "symptomatic_probability": 0.5, "random_probability": 0.0
        });
        let mut testing = w.testing(serde_json::from_value(value).unwrap());

        assert_eq!(testing.selection(&w.clock, Tick(2)), (0.0, 1.0));
        assert_eq!(testing.selection(&w.clock, Tick(3)), (0.5, 0.0));
        assert_eq!(w.test_step(&mut testing, 0).tested, 5);
        assert_eq!(w.test_step(&mut testing, 2).tested, 5);
        assert_eq!(w.test_step(&mut testing, 3).tested, 0);
        assert_eq!(w.test_step(&mut testing, 8).tested, 0);
    }

    #[test]
    fn switch_probabilities_validated() {
        let w = fixture::healthy(1);
        let mut value: serde_json::Value = serde_json::from_str(fixture::TESTING).unwrap();
        value["switch"] = serde_json::json!({
            "day": 3.0, "symptomatic_probability": 2.0, "random_probability": 0.0
        });
        let res = Testing::new(serde_json::from_value(value).unwrap(), w.tm.states());
        assert!(matches!(res, Err(InterventionError::Config { section: "testing", .. })));
    }

    #[test]
    fn flu_sick_agents_get_flu_false_positives() {
        let mut w = fixture::healthy(20);
        let mut flu = SeasonalFlu::new(
            Some(FluParams { start_day: 0.0, fraction: 1.0, duration_days: 10.0 }),
            20,
        );
        assert_eq!(flu.step(Tick(0), &w.clock, w.tm.states(), &w.pop.agents, &mut SimRng::new(1)), 20);
        w.flu = flu;

        let mut testing = w.testing(fixture::testing_params(&[
            ("random_probability", 0.0),
            ("symptomatic_probability", 1.0),
            ("flu_false_positive", 1.0),
        ]));
        let step = w.test_step(&mut testing, 0);
        assert_eq!(step.tested, 20);
        assert_eq!(testing.stats().false_positive, 20);
        assert_eq!(step.confirmed.len(), 20);
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let w = fixture::healthy(1);
        let res = Testing::new(fixture::testing_params(&[("sensitivity", 1.5)]), w.tm.states());
        assert!(matches!(res, Err(InterventionError::Config { section: "testing", .. })));
    }
}

#[cfg(test)]
mod vaccination {
    use abm_core::{AgentId, Category, SimRng};
    use abm_population::InitialStates;
    use serde_json::json;

    use super::fixture;
    use crate::{InterventionError, Vaccination};

    #[test]
    fn protection_ramps_then_wanes_to_baseline() {
        let mut w = fixture::healthy(1);
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({ "start_day": 10.0 })));
        assert_eq!(w.vaccinate(&mut campaign, 9), 0);
        assert_eq!(w.vaccinate(&mut campaign, 10), 1);

        let a = AgentId(0);
        assert_eq!(w.tm.states().name_of(a, Category::Vaccination), "vaccinated");
        let agents = &w.pop.agents;
        assert_eq!(agents.susceptibility_at(a, 10.0), 1.0);
        let ramping = agents.susceptibility_at(a, 17.0);
        assert!(ramping < 1.0 && ramping > 0.1, "{ramping}");
        assert!((agents.susceptibility_at(a, 100.0) - 0.1).abs() < 1e-9);
        assert!((agents.severity_multiplier(a, 100.0) - 0.2).abs() < 1e-9);
        assert_eq!(agents.susceptibility_at(a, 375.0), 1.0);
        assert_eq!(agents.susceptibility_at(a, 900.0), 1.0);
    }

    #[test]
    fn priority_groups_go_first() {
        let mut w = fixture::world(
            (0..10).map(|i| fixture::agent(if i >= 7 { 70 } else { 30 }, InitialStates::default())).collect(),
        );
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({
            "doses_per_step": 3,
            "priority": [ { "min_age": 65 } ]
        })));
        assert_eq!(w.vaccinate(&mut campaign, 0), 3);
        for i in 0..10 {
            assert_eq!(w.pop.agents.protection[i].is_some(), i >= 7, "agent {i}");
        }
    }

    #[test]
    fn doses_capped_by_step_and_total() {
        let mut w = fixture::healthy(20);
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({
            "doses_per_step": 5,
            "max_total": 7
        })));
        assert_eq!(w.vaccinate(&mut campaign, 0), 5);
        assert_eq!(w.vaccinate(&mut campaign, 1), 2);
        assert_eq!(w.vaccinate(&mut campaign, 2), 0);
        assert_eq!(campaign.given(), 7);
        assert_eq!(w.tm.states().counts(Category::Vaccination)[1], 7);
    }

    #[test]
    fn ineligible_agents_skipped() {
        let mut w = fixture::world(vec![
            fixture::agent(40, InitialStates::default().with(Category::Health, "dead")),
            fixture::agent(40, InitialStates::default().with(Category::Role, "isolated")),
            fixture::agent(40, InitialStates::default().with(Category::Testing, "awaiting")),
            fixture::agent(40, InitialStates::default().with(Category::Testing, "positive")),
            fixture::agent(10, InitialStates::default()),
            fixture::agent(40, InitialStates::default()),
        ]);
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({ "min_age": 16 })));
        assert_eq!(w.vaccinate(&mut campaign, 0), 1);
        assert!(w.pop.agents.protection[5].is_some());
        // Already vaccinated and no booster configured.
        assert_eq!(w.vaccinate(&mut campaign, 1), 0);
    }

    #[test]
    fn booster_ramps_from_current_level() {
        let mut w = fixture::healthy(2);
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({
            "booster": { "after_days": 200.0, "max": 1, "state": "boosted",
                         "ramp_days": 7.0, "plateau_days": 60.0, "waning_days": 100.0 }
        })));
        assert_eq!(w.vaccinate(&mut campaign, 0), 2);
        assert_eq!(w.vaccinate(&mut campaign, 100), 0);

        let a = AgentId(0);
        let before = w.pop.agents.susceptibility_at(a, 200.0);
        assert_eq!(w.vaccinate(&mut campaign, 200), 2);
        assert_eq!(w.tm.states().name_of(a, Category::Vaccination), "boosted");

        let p = w.pop.agents.protection[0].as_ref().unwrap();
        assert_eq!(p.doses, 2);
        assert_eq!(p.dosed_at_days, 200.0);
        let agents = &w.pop.agents;
        assert!((agents.susceptibility_at(a, 200.0) - before).abs() < 1e-9);
        assert!((agents.susceptibility_at(a, 207.0) - 0.1).abs() < 1e-9);
        assert!((agents.susceptibility_at(a, 267.0) - 0.1).abs() < 1e-9);
        assert_eq!(agents.susceptibility_at(a, 367.0), 1.0);

        // `max` boosters reached.
        assert_eq!(w.vaccinate(&mut campaign, 500), 0);
    }

    #[test]
    fn products_drawn_by_share() {
        let mut w = fixture::healthy(400);
        let mut params = fixture::vaccination_params(json!({ "doses_per_step": 400 }));
        let mut second = params.products[0].clone();
        second.name = "vector".into();
        second.share = 3.0;
        params.products.push(second);
        let mut campaign = w.vaccination(params);
        assert_eq!(w.vaccinate(&mut campaign, 0), 400);
        let vector = w
            .pop
            .agents
            .protection
            .iter()
            .filter(|p| p.as_ref().is_some_and(|p| p.product.index() == 1))
            .count();
        assert!((240..=360).contains(&vector), "{vector}");
    }

    #[test]
    fn initial_doses_are_back_dated() {
        let mut w = fixture::healthy(50);
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({
            "start_day": 400.0,
            "initial": { "count": 20, "offset_days": [30.0, 90.0] }
        })));
        assert_eq!(w.seed_vaccinations(&mut campaign), 20);
        assert_eq!(campaign.given(), 20);
        assert_eq!(w.tm.states().counts(Category::Vaccination)[1], 20);

        let mut seen = 0;
        for (i, p) in w.pop.agents.protection.iter().enumerate() {
            let Some(p) = p else { continue };
            seen += 1;
            assert!((-90.0..=-30.0).contains(&p.dosed_at_days), "{}", p.dosed_at_days);
            // Past the ramp already on day 0.
            assert!((w.pop.agents.susceptibility_at(AgentId(i as u32), 0.0) - 0.1).abs() < 1e-9);
        }
        assert_eq!(seen, 20);
    }

    #[test]
    fn back_dated_doses_reach_booster_early() {
        let mut w = fixture::healthy(10);
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({
            "start_day": 10.0,
            "initial": { "count": 10, "offset_days": [200.0, 200.0] },
            "booster": { "after_days": 200.0, "max": 1, "state": "boosted",
                         "ramp_days": 7.0, "plateau_days": 60.0, "waning_days": 100.0 }
        })));
        assert_eq!(w.seed_vaccinations(&mut campaign), 10);
        assert_eq!(w.vaccinate(&mut campaign, 10), 10);
        assert_eq!(w.tm.states().name_of(AgentId(0), Category::Vaccination), "boosted");
    }

    #[test]
    fn initial_doses_respect_total_cap() {
        let mut w = fixture::healthy(10);
        let mut campaign = w.vaccination(fixture::vaccination_params(json!({
            "max_total": 4,
            "initial": { "count": 8, "offset_days": [0.0, 10.0] }
        })));
        assert_eq!(w.seed_vaccinations(&mut campaign), 4);
        assert_eq!(w.vaccinate(&mut campaign, 0), 0);
    }

    #[test]
    fn reversed_offsets_rejected() {
        let w = fixture::healthy(1);
        let res = Vaccination::new(
            fixture::vaccination_params(json!({ "initial": { "count": 1, "offset_days": [9.0, 3.0] } })),
            w.tm.states(),
            SimRng::new(1),
        );
        assert!(matches!(res, Err(InterventionError::Config { section: "vaccination", .. })));
    }

    #[test]
    fn bad_configuration_rejected() {
        let w = fixture::healthy(1);
        let res = Vaccination::new(
            fixture::vaccination_params(json!({ "dose_state": "immune" })),
            w.tm.states(),
            SimRng::new(1),
        );
        assert!(matches!(res, Err(InterventionError::State(_))));

        let res = Vaccination::new(
            fixture::vaccination_params(json!({ "products": [] })),
            w.tm.states(),
            SimRng::new(1),
        );
        assert!(matches!(res, Err(InterventionError::Config { section: "vaccination", .. })));
    }
}

#[cfg(test)]
mod tracing {
    use abm_core::{AgentId, Category, SimRng, Tick};
    use abm_population::InitialStates;

    use super::fixture;
    use crate::{ContactTracing, TraceOutcome, TracingParams};

    fn params(compliance: f64, max: usize) -> TracingParams {
        serde_json::from_value(serde_json::json!({
            "window_days": 3.0,
            "compliance": compliance,
            "max_contacts": { "household": max },
            "quarantine_state": "quarantined",
            "employee_quarantine_state": "on_leave"
        }))
        .unwrap()
    }

    fn ids(v: &[u32]) -> Vec<AgentId> {
        v.iter().map(|&a| AgentId(a)).collect()
    }

    fn recorded(w: &fixture::World, compliance: f64) -> ContactTracing {
        let mut tracing = ContactTracing::new(params(compliance, 10), w.tm.states()).unwrap();
        tracing.record(&w.gathered(), Tick(0), &w.pop.places, &mut SimRng::new(2));
        tracing
    }

    #[test]
    fn records_each_pair_once_on_both_endpoints() {
        let w = fixture::healthy(3);
        let tracing = recorded(&w, 1.0);
        for a in 0..3u32 {
            let mut others: Vec<AgentId> = tracing.contacts_of(AgentId(a)).iter().map(|c| c.other).collect();
            others.sort_unstable();
            let expected: Vec<AgentId> = (0..3).filter(|&b| b != a).map(AgentId).collect();
            assert_eq!(others, expected);
        }
    }

    #[test]
    fn contacts_per_occupant_bounded() {
        let w = fixture::healthy(10);
        let mut tracing = ContactTracing::new(params(1.0, 2), w.tm.states()).unwrap();
        let n = tracing.record(&w.gathered(), Tick(0), &w.pop.places, &mut SimRng::new(2));
        // Ten occupants pick two each; a pair picked from both ends counts once.
        assert!((10..=20).contains(&n), "{n}");
        let stored: usize = (0..10).map(|a| tracing.contacts_of(AgentId(a)).len()).sum();
        assert_eq!(stored, 2 * n);
        for a in 0..10 {
            let list = tracing.contacts_of(AgentId(a));
            assert!(list.len() >= 2);
            let mut others: Vec<AgentId> = list.iter().map(|c| c.other).collect();
            others.sort_unstable();
            others.dedup();
            assert_eq!(others.len(), list.len());
        }
    }

    #[test]
    fn untraced_kind_records_nothing() {
        let w = fixture::healthy(4);
        let mut p = params(1.0, 10);
        p.max_contacts.clear();
        let mut tracing = ContactTracing::new(p, w.tm.states()).unwrap();
        assert_eq!(tracing.record(&w.gathered(), Tick(0), &w.pop.places, &mut SimRng::new(2)), 0);
    }

    #[test]
    fn tracing_is_idempotent_per_case() {
        let w = fixture::healthy(4);
        let mut tracing = recorded(&w, 1.0);
        let mut rng = SimRng::new(9);
        let first = tracing.trace(AgentId(0), Tick(1), w.tm.states(), &w.clock, &mut rng);
        assert_eq!(first.notified, ids(&[1, 2, 3]));
        assert_eq!(first.newly_notified, ids(&[1, 2, 3]));
        assert!(tracing.is_active(AgentId(0)));

        let again = tracing.trace(AgentId(0), Tick(2), w.tm.states(), &w.clock, &mut rng);
        assert_eq!(again.notified, first.notified);
        assert!(again.newly_notified.is_empty());
    }

    #[test]
    fn overlapping_cases_notify_once() {
        let w = fixture::healthy(4);
        let mut tracing = recorded(&w, 1.0);
        let mut rng = SimRng::new(9);
        tracing.trace(AgentId(0), Tick(1), w.tm.states(), &w.clock, &mut rng);
        let second = tracing.trace(AgentId(1), Tick(1), w.tm.states(), &w.clock, &mut rng);
        assert_eq!(second.notified, ids(&[0, 2, 3]));
        assert_eq!(second.newly_notified, ids(&[0]));

        tracing.resolve(AgentId(0));
        assert!(!tracing.is_active(AgentId(0)));
        assert!(tracing.contacts_of(AgentId(0)).is_empty());
        // Still under notice from case 1.
        assert!(tracing.is_notified(AgentId(2)));
        tracing.resolve(AgentId(1));
        assert!(!tracing.is_notified(AgentId(2)));
        assert!(tracing.active_cases().is_empty());
    }

    #[test]
    fn window_limits_contacts() {
        let w = fixture::healthy(3);
        let mut tracing = recorded(&w, 1.0);
        let outcome = tracing.trace(AgentId(0), Tick(4), w.tm.states(), &w.clock, &mut SimRng::new(1));
        assert_eq!(outcome.notified, Vec::<AgentId>::new());

        tracing.purge(Tick(3), &w.clock);
        assert!(!tracing.contacts_of(AgentId(1)).is_empty());
        tracing.purge(Tick(4), &w.clock);
        assert!(tracing.contacts_of(AgentId(1)).is_empty());
    }

    #[test]
    fn zero_compliance_notifies_nobody() {
        let w = fixture::healthy(5);
        let mut tracing = recorded(&w, 0.0);
        let outcome = tracing.trace(AgentId(0), Tick(1), w.tm.states(), &w.clock, &mut SimRng::new(1));
        assert_eq!(outcome, TraceOutcome::default());
    }

    #[test]
    fn dead_hospitalized_excluded() {
        let w = fixture::world(vec![
            fixture::agent(40, InitialStates::default()),
            fixture::agent(40, InitialStates::default().with(Category::Health, "dead")),
            fixture::agent(40, InitialStates::default().with(Category::Health, "hospitalized")),
            fixture::agent(40, InitialStates::default()),
        ]);
        let mut tracing = recorded(&w, 1.0);
        let mut rng = SimRng::new(1);
        let outcome = tracing.trace(AgentId(0), Tick(1), w.tm.states(), &w.clock, &mut rng);
        assert_eq!(outcome.notified, ids(&[3]));

        // A hospitalized index case is not traced.
        let outcome = tracing.trace(AgentId(2), Tick(1), w.tm.states(), &w.clock, &mut rng);
        assert_eq!(outcome, TraceOutcome::default());
        assert!(!tracing.is_active(AgentId(2)));
    }

    #[test]
    fn notified_contacts_quarantine_and_test() {
        let mut w = fixture::world(vec![
            fixture::agent(40, InitialStates::default()),
            fixture::agent(40, InitialStates::default()),
            fixture::employee(InitialStates::default()),
        ]);
        let mut tracing = recorded(&w, 1.0);
        let mut testing = w.testing(fixture::testing_params(&[("random_probability", 0.0)]));
        let outcome = tracing.trace(AgentId(0), Tick(1), w.tm.states(), &w.clock, &mut SimRng::new(1));

        let mut tctx = abm_transitions::TransitionCtx {
            agents: &w.pop.agents,
            rngs:   &mut w.pop.rngs,
            clock:  &w.clock,
            audit:  &mut w.audit,
        };
        let quarantined = tracing.notify(&outcome, Tick(1), &mut w.tm, Some(&mut testing), &mut tctx);
        assert_eq!(quarantined, 2);
        assert_eq!(w.tm.states().name_of(AgentId(1), Category::Role), "quarantined");
        assert_eq!(w.tm.states().name_of(AgentId(2), Category::Role), "on_leave");
        assert_eq!(w.tm.states().name_of(AgentId(0), Category::Role), "active");
        assert!(testing.is_obliged(AgentId(1)) && testing.is_obliged(AgentId(2)));
        assert!(!testing.is_obliged(AgentId(0)));
    }

    #[test]
    fn closed_cases_resolved() {
        let mut w = fixture::infected(3);
        let mut testing = w.testing(fixture::testing_params(&[]));
        w.test_step(&mut testing, 0);
        let mut tracing = recorded(&w, 1.0);
        tracing.trace(AgentId(0), Tick(1), w.tm.states(), &w.clock, &mut SimRng::new(1));
        assert_eq!(tracing.resolve_closed(w.tm.states()), 0);

        assert!(w.set(AgentId(0), Category::Testing, "awaiting", 2));
        assert_eq!(tracing.resolve_closed(w.tm.states()), 1);
        assert!(!tracing.is_active(AgentId(0)));
    }
}
