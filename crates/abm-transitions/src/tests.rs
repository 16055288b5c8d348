//! Unit tests for abm-transitions.

#[cfg(test)]
mod fixture {
    use abm_core::{AuditLog, SimClock};
    use abm_population::{AgentKind, AgentRngs, AgentStore, InitialStates};
    use abm_states::{StatesManager, StatesSpec, Taxonomy, TaxonomySpec};

    use crate::{TransitionCtx, TransitionsManager, TransitionsSpec};

    const TAXONOMY: &str = r#"{
        "health": { "initial": "susceptible", "states": [
            { "name": "susceptible", "traits": ["susceptible"] },
            { "name": "exposed",     "traits": ["infected", "infectious"], "infectiousness": 0.5 },
            { "name": "symptomatic", "traits": ["infected", "infectious", "symptomatic"], "infectiousness": 1.0 },
            { "name": "recovered" },
            { "name": "dead",        "traits": ["dead"] }
        ]},
        "role": { "initial": "active", "states": [
            { "name": "active" }, { "name": "isolated", "traits": ["isolated"] }
        ]},
        "testing": { "initial": "untested", "states": [
            { "name": "untested" }, { "name": "awaiting", "traits": ["pending"] },
            { "name": "positive", "traits": ["confirmed"] }, { "name": "negative" }
        ]},
        "vaccination": { "initial": "none", "states": [
            { "name": "none" }, { "name": "vaccinated", "traits": ["vaccinated"] }
        ]}
    }"#;

    const STATES: &str = r#"{
        "regular": { "edges": {
            "health": [["susceptible","exposed"],["exposed","symptomatic"],["exposed","recovered"],
                       ["symptomatic","recovered"],["symptomatic","dead"]],
            "role": [["active","isolated"],["isolated","active"]],
            "testing": [["untested","awaiting"],["awaiting","positive"],["awaiting","negative"]],
            "vaccination": [["none","vaccinated"]]
        }}
    }"#;

    pub const RULES: &str = r#"{
        "regular": [
            { "category": "health", "from": "exposed",
              "branches": [ { "to": "symptomatic", "probability": 1.0 } ],
              "duration": { "dist": "fixed", "days": 1.0 } },
            { "category": "health", "from": "symptomatic",
              "remainder": "recovered",
              "duration": { "dist": "fixed", "days": 1.5 } },
            { "category": "testing", "from": "awaiting",
              "remainder": "negative",
              "duration": { "dist": "fixed", "days": 1.0 } }
        ]
    }"#;

    pub struct World {
        pub agents: AgentStore,
        pub rngs:   AgentRngs,
        pub clock:  SimClock,
        pub audit:  AuditLog,
    }

    impl World {
        pub fn ctx(&mut self) -> TransitionCtx<'_> {
            TransitionCtx {
                agents: &self.agents,
                rngs:   &mut self.rngs,
                clock:  &self.clock,
                audit:  &mut self.audit,
            }
        }
    }

    pub fn taxonomy() -> Taxonomy {
        let spec: TaxonomySpec = serde_json::from_str(TAXONOMY).unwrap();
        Taxonomy::from_spec(&spec).unwrap()
    }

    pub fn states(agents: &AgentStore, initial: &[InitialStates]) -> StatesManager {
        let spec: StatesSpec = serde_json::from_str(STATES).unwrap();
        StatesManager::new(taxonomy(), &spec, agents, initial).unwrap()
    }

    /// `n` agents all starting from `initial`, one-day steps.
    pub fn build(
        n:       usize,
        kind:    AgentKind,
        initial: InitialStates,
        rules:   &str,
    ) -> (World, TransitionsManager) {
        let mut agents = AgentStore::new(n);
        agents.kind = vec![kind; n];
        agents.age = vec![40; n];
        let init = vec![initial; n];
        let spec: TransitionsSpec = serde_json::from_str(rules).unwrap();
        let tm = TransitionsManager::new(states(&agents, &init), &spec, &agents).unwrap();
        let world = World {
            rngs: AgentRngs::new(n, 7),
            agents,
            clock: SimClock::new(1.0),
            audit: AuditLog::new(),
        };
        (world, tm)
    }
}

#[cfg(test)]
mod scheduling {
    use abm_core::{AgentId, AuditKind, Category, Tick};
    use abm_population::{AgentKind, InitialStates};

    use super::fixture;
    use crate::{TransitionError, TransitionsManager, TransitionsSpec};

    fn exposed() -> InitialStates {
        InitialStates::default().with(Category::Health, "exposed")
    }

    #[test]
    fn schedule_all_samples_initial_states() {
        let (mut w, mut tm) = fixture::build(3, AgentKind::Regular, exposed(), fixture::RULES);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        let symptomatic = tm.states().taxonomy().require(Category::Health, "symptomatic").unwrap();
        assert_eq!(tm.schedule(AgentId(2)), Some((Category::Health, symptomatic, Tick(1))));
        assert!(tm.pending(AgentId(0), Category::Role).is_none());
    }

    #[test]
    fn advance_walks_the_chain() {
        let (mut w, mut tm) = fixture::build(1, AgentKind::Regular, exposed(), fixture::RULES);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());

        assert_eq!(tm.advance(Tick(0), &mut w.ctx()), 0);
        assert_eq!(tm.advance(Tick(1), &mut w.ctx()), 1);
        assert_eq!(tm.states().name_of(AgentId(0), Category::Health), "symptomatic");

        // 1.5 days rounds up to two one-day ticks.
        assert_eq!(tm.pending(AgentId(0), Category::Health).map(|s| s.due), Some(Tick(3)));
        assert_eq!(tm.advance(Tick(2), &mut w.ctx()), 0);
        assert_eq!(tm.advance(Tick(3), &mut w.ctx()), 1);
        assert_eq!(tm.states().name_of(AgentId(0), Category::Health), "recovered");
        assert!(tm.schedule(AgentId(0)).is_none());
    }

    #[test]
    fn zero_duration_still_takes_a_tick() {
        let rules = r#"{ "regular": [
            { "category": "health", "from": "exposed", "remainder": "recovered",
              "duration": { "dist": "fixed", "days": 0.0 } } ] }"#;
        let (mut w, mut tm) = fixture::build(1, AgentKind::Regular, exposed(), rules);
        tm.schedule_all(Tick(4), &mut w.ctx());
        assert_eq!(tm.pending(AgentId(0), Category::Health).map(|s| s.due), Some(Tick(5)));
    }

    #[test]
    fn same_tick_ties_follow_priority() {
        let init = exposed().with(Category::Testing, "awaiting");
        let (mut w, mut tm) = fixture::build(1, AgentKind::Regular, init.clone(), fixture::RULES);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        assert_eq!(tm.schedule(AgentId(0)).map(|s| s.0), Some(Category::Health));

        let mut spec: TransitionsSpec = serde_json::from_str(fixture::RULES).unwrap();
        spec.category_priority =
            vec![Category::Testing, Category::Health, Category::Role, Category::Vaccination];
        let states = fixture::states(&w.agents, &[init]);
        let mut tm = TransitionsManager::new(states, &spec, &w.agents).unwrap();
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        assert_eq!(tm.schedule(AgentId(0)).map(|s| s.0), Some(Category::Testing));

        assert_eq!(tm.advance(Tick(1), &mut w.ctx()), 2);
        assert_eq!(tm.states().name_of(AgentId(0), Category::Testing), "negative");
        assert_eq!(tm.states().name_of(AgentId(0), Category::Health), "symptomatic");
    }

    #[test]
    fn incomplete_priority_rejected() {
        let mut spec: TransitionsSpec = serde_json::from_str(fixture::RULES).unwrap();
        spec.category_priority = vec![Category::Health, Category::Health];
        let (w, _) = fixture::build(1, AgentKind::Regular, InitialStates::default(), fixture::RULES);
        let states = fixture::states(&w.agents, &[InitialStates::default()]);
        assert!(matches!(
            TransitionsManager::new(states, &spec, &w.agents),
            Err(TransitionError::Config(_))
        ));
    }

    #[test]
    fn unknown_state_in_rule_rejected() {
        let rules = r#"{ "regular": [
            { "category": "health", "from": "zombie", "remainder": "recovered",
              "duration": { "dist": "fixed", "days": 1.0 } } ] }"#;
        let spec: TransitionsSpec = serde_json::from_str(rules).unwrap();
        let (w, _) = fixture::build(1, AgentKind::Regular, InitialStates::default(), fixture::RULES);
        let states = fixture::states(&w.agents, &[InitialStates::default()]);
        assert!(matches!(
            TransitionsManager::new(states, &spec, &w.agents),
            Err(TransitionError::State(_))
        ));
    }

    #[test]
    fn patients_fall_back_to_regular_rules() {
        let (mut w, mut tm) = fixture::build(2, AgentKind::HospitalPatient, exposed(), fixture::RULES);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        assert!(tm.pending(AgentId(1), Category::Health).is_some());
    }

    #[test]
    fn variant_rule_overrides_regular() {
        let rules = r#"{
            "regular": [
              { "category": "health", "from": "exposed", "remainder": "symptomatic",
                "duration": { "dist": "fixed", "days": 1.0 } } ],
            "hospital_employee": [
              { "category": "health", "from": "exposed", "remainder": "recovered",
                "duration": { "dist": "fixed", "days": 3.0 } } ]
        }"#;
        let (mut w, mut tm) = fixture::build(1, AgentKind::HospitalEmployee, exposed(), rules);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        let recovered = tm.states().taxonomy().require(Category::Health, "recovered").unwrap();
        assert_eq!(tm.schedule(AgentId(0)), Some((Category::Health, recovered, Tick(3))));
    }

    #[test]
    fn rejected_write_is_audited_and_dropped() {
        let (mut w, mut tm) =
            fixture::build(1, AgentKind::Regular, InitialStates::default(), fixture::RULES);
        let dead = tm.states().taxonomy().require(Category::Health, "dead").unwrap();
        assert!(tm.transition(AgentId(0), Category::Health, dead, Tick(1), &mut w.ctx()).is_none());
        assert_eq!(w.audit.count(AuditKind::InvalidTransition), 1);
        assert_eq!(tm.states().name_of(AgentId(0), Category::Health), "susceptible");
    }

    #[test]
    fn external_write_reschedules() {
        let (mut w, mut tm) =
            fixture::build(1, AgentKind::Regular, InitialStates::default(), fixture::RULES);
        let exposed = tm.states().taxonomy().require(Category::Health, "exposed").unwrap();
        let applied = tm.transition(AgentId(0), Category::Health, exposed, Tick(5), &mut w.ctx());
        assert!(applied.is_some());
        assert_eq!(tm.pending(AgentId(0), Category::Health).map(|s| s.due), Some(Tick(6)));
    }

    #[test]
    fn overfull_branches_are_clamped_and_audited() {
        let rules = r#"{ "regular": [
            { "category": "health", "from": "exposed",
              "branches": [ { "to": "symptomatic", "probability": 0.8 },
                            { "to": "recovered",   "probability": 0.8 } ],
              "duration": { "dist": "fixed", "days": 1.0 } } ] }"#;
        let (mut w, mut tm) = fixture::build(50, AgentKind::Regular, exposed(), rules);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        assert_eq!(w.audit.count(AuditKind::DomainClamp), 50);
        assert!((0..50).all(|i| tm.pending(AgentId(i), Category::Health).is_some()));
    }

    #[test]
    fn missing_remainder_means_stay() {
        let rules = r#"{ "regular": [
            { "category": "health", "from": "exposed",
              "branches": [ { "to": "symptomatic", "probability": 0.0 } ],
              "duration": { "dist": "fixed", "days": 1.0 } } ] }"#;
        let (mut w, mut tm) = fixture::build(5, AgentKind::Regular, exposed(), rules);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        assert!((0..5).all(|i| tm.schedule(AgentId(i)).is_none()));
    }

    #[test]
    fn exponential_durations_have_expected_mean() {
        let rules = r#"{ "regular": [
            { "category": "health", "from": "exposed", "remainder": "recovered",
              "duration": { "dist": "exponential", "mean": 4.0 } } ] }"#;
        let n = 4000;
        let (mut w, mut tm) = fixture::build(n, AgentKind::Regular, exposed(), rules);
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        let total: u64 = (0..n as u32)
            .map(|i| tm.pending(AgentId(i), Category::Health).map_or(0, |s| s.due.0))
            .sum();
        let mean = total as f64 / n as f64;
        // Rounding up adds about half a tick on average.
        assert!((3.9..5.1).contains(&mean), "mean ticks {mean}");
    }

    #[test]
    fn age_curve_probability() {
        let rules = r#"{ "regular": [
            { "category": "health", "from": "exposed",
              "branches": [ { "to": "symptomatic",
                "probability": { "input": "age",
                  "function": { "points": [[0,0.0],[30,0.0],[50,1.0],[100,1.0]] } } } ],
              "remainder": "recovered",
              "duration": { "dist": "fixed", "days": 1.0 } } ] }"#;
        let (mut w, mut tm) = fixture::build(2, AgentKind::Regular, exposed(), rules);
        w.agents.age = vec![10, 80];
        tm.schedule_all(Tick::ZERO, &mut w.ctx());
        let t = tm.states().taxonomy();
        assert_eq!(tm.pending(AgentId(0), Category::Health).map(|s| s.to), t.lookup(Category::Health, "recovered"));
        assert_eq!(tm.pending(AgentId(1), Category::Health).map(|s| s.to), t.lookup(Category::Health, "symptomatic"));
    }
}

#[cfg(test)]
mod flu {
    use abm_core::{AgentId, Category, SimClock, SimRng, Tick};
    use abm_population::{AgentKind, AgentStore, InitialStates};

    use super::fixture;
    use crate::{FluParams, FluStatus, SeasonalFlu};

    fn params() -> FluParams {
        FluParams { start_day: 2.0, fraction: 0.5, duration_days: 3.0 }
    }

    #[test]
    fn waits_for_start_day() {
        let agents = AgentStore::new(10);
        let states = fixture::states(&agents, &vec![InitialStates::default(); 10]);
        let mut flu = SeasonalFlu::new(Some(params()), 10);
        let clock = SimClock::new(1.0);
        let mut rng = SimRng::new(1);
        assert_eq!(flu.step(Tick(1), &clock, &states, &agents, &mut rng), 0);
        assert_eq!(flu.step(Tick(2), &clock, &states, &agents, &mut rng), 5);
        assert_eq!(flu.sick_count(), 5);
    }

    #[test]
    fn excludes_infected_vaccinated_and_staff() {
        let mut agents = AgentStore::new(8);
        agents.kind[0] = AgentKind::HospitalEmployee;
        agents.kind[1] = AgentKind::HospitalPatient;
        let mut init = vec![InitialStates::default(); 8];
        init[2] = InitialStates::default().with(Category::Health, "exposed");
        init[3] = InitialStates::default().with(Category::Vaccination, "vaccinated");
        init[4] = InitialStates::default().with(Category::Health, "dead");
        let states = fixture::states(&agents, &init);

        let mut flu = SeasonalFlu::new(
            Some(FluParams { start_day: 0.0, fraction: 1.0, duration_days: 3.0 }),
            8,
        );
        let clock = SimClock::new(1.0);
        assert_eq!(flu.step(Tick(0), &clock, &states, &agents, &mut SimRng::new(3)), 3);
        for i in 0..5 {
            assert_eq!(flu.status(AgentId(i)), FluStatus::None);
        }
        assert!(flu.presents_symptoms(&states, AgentId(6)));
        assert!(!flu.presents_symptoms(&states, AgentId(3)));
    }

    #[test]
    fn recovered_agents_are_replaced() {
        let agents = AgentStore::new(20);
        let states = fixture::states(&agents, &vec![InitialStates::default(); 20]);
        let mut flu = SeasonalFlu::new(Some(params()), 20);
        let clock = SimClock::new(1.0);
        let mut rng = SimRng::new(9);

        assert_eq!(flu.step(Tick(2), &clock, &states, &agents, &mut rng), 10);
        let first: Vec<_> = (0..20).filter(|&i| flu.is_sick(AgentId(i))).collect();

        // Bouts end at tick 5; the 10 recovered leave 10 eligible, half of
        // which are kept sick.
        assert_eq!(flu.step(Tick(5), &clock, &states, &agents, &mut rng), 5);
        assert_eq!(flu.sick_count(), 5);
        assert!(first.iter().all(|&i| flu.status(AgentId(i)) == FluStatus::Recovered));
    }

    #[test]
    fn disabled_never_sickens() {
        let agents = AgentStore::new(4);
        let states = fixture::states(&agents, &vec![InitialStates::default(); 4]);
        let mut flu = SeasonalFlu::disabled(4);
        let clock = SimClock::new(1.0);
        assert_eq!(flu.step(Tick(50), &clock, &states, &agents, &mut SimRng::new(0)), 0);
    }
}
