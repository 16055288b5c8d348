//! Unit tests for abm-population.

#[cfg(test)]
fn place(id: u32, kind: crate::PlaceKind, capacity: u32) -> crate::Place {
    crate::Place { id: abm_core::PlaceId(id), kind, capacity, transmission: None }
}

#[cfg(test)]
mod builder {
    use abm_core::{AgentId, PlaceId};

    use super::place;
    use crate::{AgentKind, AgentRecord, PlaceKind, PopulationBuilder, PopulationError};

    fn resident(household: u32) -> AgentRecord {
        AgentRecord { age: 30, household: Some(household), ..Default::default() }
    }

    #[test]
    fn builds_store_and_rngs() {
        let pop = PopulationBuilder::new(1)
            .places(vec![place(0, PlaceKind::Household, 3), place(1, PlaceKind::Workplace, 10)])
            .agents(vec![
                AgentRecord { work: Some(1), ..resident(0) },
                resident(0),
            ])
            .build()
            .unwrap();
        assert_eq!(pop.agents.count, 2);
        assert_eq!(pop.rngs.len(), 2);
        assert_eq!(pop.agents.work[0], PlaceId(1));
        assert_eq!(pop.agents.work[1], PlaceId::INVALID);
        assert_eq!(pop.places.of_kind(PlaceKind::Workplace), &[PlaceId(1)]);
        assert_eq!(pop.initial.len(), 2);
    }

    #[test]
    fn zero_agents() {
        let pop = PopulationBuilder::new(1).build().unwrap();
        assert_eq!(pop.agents.count, 0);
        assert!(pop.rngs.is_empty());
    }

    #[test]
    fn household_over_capacity_is_fatal() {
        let err = PopulationBuilder::new(1)
            .places(vec![place(0, PlaceKind::Household, 2)])
            .agents(vec![resident(0), resident(0), resident(0)])
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PopulationError::CapacityExceeded { place: PlaceId(0), assigned: 3, capacity: 2 }
        ));
    }

    #[test]
    fn wrong_kind_reference_rejected() {
        let err = PopulationBuilder::new(1)
            .places(vec![place(0, PlaceKind::Household, 2), place(1, PlaceKind::Leisure, 9)])
            .agents(vec![AgentRecord { school: Some(1), ..resident(0) }])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, PopulationError::WrongPlaceKind { field: "school", .. }));
    }

    #[test]
    fn unknown_place_rejected() {
        let err = PopulationBuilder::new(1)
            .places(vec![place(0, PlaceKind::Household, 2)])
            .agents(vec![resident(7)])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, PopulationError::UnknownPlace { place: 7, .. }));
    }

    #[test]
    fn patient_needs_hospital_and_lives_there() {
        let places = vec![place(0, PlaceKind::Household, 2), place(1, PlaceKind::Hospital, 5)];
        let missing = PopulationBuilder::new(1)
            .places(places.clone())
            .agents(vec![AgentRecord { kind: AgentKind::HospitalPatient, ..Default::default() }])
            .build();
        assert!(matches!(missing, Err(PopulationError::MissingAssignment { field: "hospital", .. })));

        let pop = PopulationBuilder::new(1)
            .places(places)
            .agents(vec![AgentRecord {
                kind: AgentKind::HospitalPatient,
                hospital: Some(1),
                ..Default::default()
            }])
            .build()
            .unwrap();
        assert_eq!(pop.agents.home(AgentId(0)), PlaceId(1));
    }

    #[test]
    fn hospital_counts_staff_and_patients() {
        let err = PopulationBuilder::new(1)
            .places(vec![place(0, PlaceKind::Household, 5), place(1, PlaceKind::Hospital, 1)])
            .agents(vec![
                AgentRecord { kind: AgentKind::HospitalEmployee, hospital: Some(1), ..resident(0) },
                AgentRecord { kind: AgentKind::HospitalPatient, hospital: Some(1), ..Default::default() },
            ])
            .build();
        assert!(matches!(err, Err(PopulationError::CapacityExceeded { place: PlaceId(1), .. })));
    }

    #[test]
    fn variability_has_unit_mean() {
        let agents: Vec<_> = (0..2_000).map(|_| resident(0)).collect();
        let pop = PopulationBuilder::new(3)
            .places(vec![place(0, PlaceKind::Household, 2_000)])
            .agents(agents)
            .infectiousness_variability(Some(4.0))
            .build()
            .unwrap();
        let mean = pop.agents.variability.iter().sum::<f64>() / 2_000.0;
        assert!((mean - 1.0).abs() < 0.05, "mean {mean}");
    }
}

#[cfg(test)]
mod store {
    use abm_core::{AgentId, PlaceId, ProductId, TransitionFunction};

    use crate::{AgentStore, Protection};

    #[test]
    fn agent_ids_iterator() {
        let store = AgentStore::new(3);
        let ids: Vec<_> = store.agent_ids().collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(1), AgentId(2)]);
    }

    #[test]
    fn sentinels() {
        let store = AgentStore::new(2);
        assert_eq!(store.household[1], PlaceId::INVALID);
        assert_eq!(store.susceptibility_at(AgentId(0), 10.0), 1.0);
        assert_eq!(store.severity_multiplier(AgentId(0), 10.0), 1.0);
    }

    #[test]
    fn protection_reduces_multipliers() {
        let mut store = AgentStore::new(1);
        let curve = TransitionFunction::three_part([(0.0, 0.0), (10.0, 0.5), (20.0, 0.5), (30.0, 0.0)])
            .unwrap()
            .with_default(0.0);
        store.protection[0] = Some(Protection {
            product:        ProductId(0),
            doses:          1,
            dosed_at_days:  0.0,
            susceptibility: curve.clone(),
            transmission:   curve.clone(),
            severity:       curve,
        });
        let a = AgentId(0);
        assert_eq!(store.susceptibility_at(a, 15.0), 0.5);
        assert_eq!(store.infectiousness_at(a, 15.0), 0.5);
        assert_eq!(store.severity_multiplier(a, 15.0), 0.5);
        assert_eq!(store.susceptibility_at(a, 40.0), 1.0);
    }
}

#[cfg(test)]
mod rngs {
    use abm_core::AgentId;

    use crate::AgentRngs;

    #[test]
    fn per_agent_determinism() {
        let mut a = AgentRngs::new(4, 99);
        let mut b = AgentRngs::new(4, 99);
        for i in 0..4 {
            let x: u64 = a.get_mut(AgentId(i)).random();
            let y: u64 = b.get_mut(AgentId(i)).random();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = AgentRngs::new(1, 1);
        let mut b = AgentRngs::new(1, 2);
        let x: u64 = a.get_mut(AgentId(0)).random();
        let y: u64 = b.get_mut(AgentId(0)).random();
        assert_ne!(x, y);
    }
}

#[cfg(test)]
mod loader {
    use std::io::Cursor;

    use abm_core::{Category, PlaceId};

    use crate::{AgentKind, PlaceKind, PopulationError, load_agents_reader, load_places_reader};

    const PLACES: &str = "\
place_id,kind,capacity,contact_intensity,dwell_days
0,household,4,,
1,workplace,40,0.3,0.33
2,hospital,20,,
";

    const AGENTS: &str = "\
agent_id,kind,age,household,school,work,hospital,transit,works_from_home,susceptibility,health,role,testing,vaccination
0,regular,34,0,,1,,,false,,,,,
1,hospital_employee,51,0,,,2,,false,0.8,exposed,,,
2,hospital_patient,80,,,,2,,,,,,,
";

    #[test]
    fn places_parse() {
        let places = load_places_reader(Cursor::new(PLACES)).unwrap();
        assert_eq!(places.len(), 3);
        assert_eq!(places[1].kind, PlaceKind::Workplace);
        assert_eq!(places[1].transmission.unwrap().contact_intensity, 0.3);
        assert!(places[0].transmission.is_none());
        assert_eq!(places[2].id, PlaceId(2));
    }

    #[test]
    fn agents_parse() {
        let agents = load_agents_reader(Cursor::new(AGENTS)).unwrap();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[0].work, Some(1));
        assert_eq!(agents[1].kind, AgentKind::HospitalEmployee);
        assert_eq!(agents[1].susceptibility, Some(0.8));
        assert_eq!(agents[1].initial.get(Category::Health), Some("exposed"));
        assert_eq!(agents[0].initial.get(Category::Health), None);
        assert_eq!(agents[2].household, None);
    }

    #[test]
    fn out_of_order_ids_rejected() {
        let csv = "place_id,kind,capacity,contact_intensity,dwell_days\n1,household,4,,\n";
        assert!(matches!(
            load_places_reader(Cursor::new(csv)),
            Err(PopulationError::PlaceOrder { row: 0, id: 1 })
        ));
    }

    #[test]
    fn half_override_rejected() {
        let csv = "place_id,kind,capacity,contact_intensity,dwell_days\n0,household,4,0.2,\n";
        assert!(matches!(load_places_reader(Cursor::new(csv)), Err(PopulationError::Parse(_))));
    }
}
