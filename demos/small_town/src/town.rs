//! The town: thirteen places, twenty-nine people and one parameter set.

/// Six four-person households, one workplace, a school, a hospital, a bus
/// line, two leisure venues and a retirement home.
pub const PLACES_CSV: &str = "\
place_id,kind,capacity,contact_intensity,dwell_days
0,household,4,,
1,household,4,,
2,household,4,,
3,household,4,,
4,household,4,,
5,household,4,,
6,workplace,12,,
7,school,14,,
8,hospital,8,0.15,0.5
9,transit,20,,
10,leisure,6,,
11,leisure,6,,
12,retirement_home,6,,
";

/// Two adults and two children per household.  Agents 0 and 4 work at the
/// hospital, agent 9 works from home, agent 5 arrives already exposed and
/// agent 28 is an inpatient.
pub const AGENTS_CSV: &str = "\
agent_id,kind,age,household,school,work,hospital,transit,works_from_home,susceptibility,health,role,testing,vaccination
0,hospital_employee,41,0,,,8,9,,,,,,
1,regular,39,0,,6,,9,,,,,,
2,regular,12,0,7,,,,,0.8,,,,
3,regular,9,0,7,,,,,0.8,,,,
4,hospital_employee,35,1,,,8,9,,,,,,
5,regular,36,1,,6,,9,,,exposed,,,
6,regular,7,1,7,,,,,0.8,,,,
7,regular,5,1,7,,,,,0.8,,,,
8,regular,52,2,,6,,9,,,,,,
9,regular,50,2,,6,,9,true,,,,,
10,regular,15,2,7,,,,,,,,,
11,regular,13,2,7,,,,,0.8,,,,
12,regular,29,3,,6,,9,,,,,,
13,regular,31,3,,6,,9,,,,,,
14,regular,6,3,7,,,,,0.8,,,,
15,regular,8,3,7,,,,,0.8,,,,
16,regular,44,4,,6,,9,,,,,,
17,regular,46,4,,6,,9,,,,,,
18,regular,14,4,7,,,,,,,,,
19,regular,11,4,7,,,,,0.8,,,,
20,regular,61,5,,6,,9,,1.2,,,,
21,regular,58,5,,6,,9,,,,,,
22,regular,16,5,7,,,,,,,,,
23,regular,10,5,7,,,,,0.8,,,,
24,regular,78,12,,,,,,1.3,,,,
25,regular,82,12,,,,,,1.3,,,,
26,regular,85,12,,,,,,1.4,,,,
27,regular,90,12,,,,,,1.5,,,,
28,hospital_patient,70,,,,8,,,1.2,hospitalized,,,
";

/// A seven-state disease course with testing, contact tracing and a
/// vaccination campaign prioritising the retirement home.  Hospital staff
/// add a return-from-leave rule to the regular one.  Schools close on day
/// 30 and a lockdown follows on day 35.  Day 60 reopens schools and leisure
/// venues, and workplaces and buses at reduced contact.
pub const PARAMS_JSON: &str = r#"{
  "simulation": { "total_ticks": 90, "step_days": 1.0, "seed": 2024, "output_interval_ticks": 7 },
  "taxonomy": {
    "health": { "initial": "susceptible", "states": [
      { "name": "susceptible",  "traits": ["susceptible"] },
      { "name": "exposed",      "traits": ["infected"] },
      { "name": "asymptomatic", "traits": ["infected", "infectious"], "infectiousness": 0.5 },
      { "name": "symptomatic",  "traits": ["infected", "infectious", "symptomatic"], "infectiousness": 1.0 },
      { "name": "hospitalized", "traits": ["infected", "infectious", "hospitalized"], "infectiousness": 0.3 },
      { "name": "recovered" },
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
  },
  "states": {
    "regular": {
      "edges": {
        "health": [["susceptible", "exposed"], ["exposed", "asymptomatic"], ["exposed", "symptomatic"],
                   ["asymptomatic", "recovered"], ["symptomatic", "recovered"], ["symptomatic", "hospitalized"],
                   ["hospitalized", "recovered"], ["hospitalized", "dead"]],
        "role": [["active", "isolated"], ["active", "quarantined"], ["quarantined", "isolated"],
                 ["isolated", "active"], ["quarantined", "active"]],
        "testing": [["untested", "awaiting"], ["awaiting", "positive"], ["awaiting", "negative"],
                    ["negative", "awaiting"], ["positive", "untested"]],
        "vaccination": [["none", "vaccinated"], ["vaccinated", "boosted"]]
      },
      "coupling": [
        { "when": { "category": "testing", "state": "positive" },
          "then": { "category": "role", "state": "isolated" },
          "from": ["active", "quarantined"] }
      ]
    },
    "hospital_employee": {
      "edges": {
        "health": [["susceptible", "exposed"], ["exposed", "asymptomatic"], ["exposed", "symptomatic"],
                   ["asymptomatic", "recovered"], ["symptomatic", "recovered"], ["symptomatic", "hospitalized"],
                   ["hospitalized", "recovered"], ["hospitalized", "dead"]],
        "role": [["active", "on_leave"], ["on_leave", "active"]],
        "testing": [["untested", "awaiting"], ["awaiting", "positive"], ["awaiting", "negative"],
                    ["negative", "awaiting"], ["positive", "untested"]],
        "vaccination": [["none", "vaccinated"], ["vaccinated", "boosted"]]
      },
      "coupling": [
        { "when": { "category": "testing", "state": "positive" },
          "then": { "category": "role", "state": "on_leave" },
          "from": ["active"] }
      ]
    }
  },
  "transitions": {
    "regular": [
      { "category": "health", "from": "exposed",
        "branches": [ { "to": "symptomatic",
                        "probability": { "input": "age", "function": { "points": [[0, 0.3], [20, 0.5], [60, 0.7], [100, 0.85]] } } } ],
        "remainder": "asymptomatic",
        "duration": { "dist": "log_normal", "mean": 4.0, "std": 1.5 } },
      { "category": "health", "from": "asymptomatic", "remainder": "recovered",
        "duration": { "dist": "gamma", "shape": 4.0, "scale": 1.75 } },
      { "category": "health", "from": "symptomatic",
        "branches": [ { "to": "hospitalized", "scale_by_severity": true,
                        "probability": { "input": "age", "function": { "points": [[0, 0.01], [40, 0.03], [70, 0.15], [100, 0.35]] } } } ],
        "remainder": "recovered",
        "duration": { "dist": "gamma", "shape": 5.0, "scale": 1.6 } },
      { "category": "health", "from": "hospitalized",
        "branches": [ { "to": "dead", "probability": 0.12, "scale_by_severity": true } ],
        "remainder": "recovered",
        "duration": { "dist": "weibull", "shape": 2.0, "scale": 11.0 } },
      { "category": "role", "from": "isolated", "remainder": "active",
        "duration": { "dist": "fixed", "days": 10.0 } },
      { "category": "role", "from": "quarantined", "remainder": "active",
        "duration": { "dist": "fixed", "days": 7.0 } },
      { "category": "testing", "from": "positive", "remainder": "untested",
        "duration": { "dist": "fixed", "days": 30.0 } }
    ],
    "hospital_employee": [
      { "category": "role", "from": "on_leave", "remainder": "active",
        "duration": { "dist": "fixed", "days": 7.0 } }
    ]
  },
  "flu": { "start_day": 20.0, "fraction": 0.1, "duration_days": 5.0 },
  "infection": {
    "on_infection": "exposed",
    "places": {
      "household":       { "contact_intensity": 0.35, "dwell_days": 0.6, "density_exponent": 0.0, "isolation_factor": 0.5 },
      "workplace":       { "contact_intensity": 0.10, "dwell_days": 0.35, "outside_lambda": 0.01 },
      "school":          { "contact_intensity": 0.15, "dwell_days": 0.3 },
      "hospital":        { "contact_intensity": 0.20, "dwell_days": 0.4 },
      "transit":         { "contact_intensity": 0.05, "dwell_days": 0.05 },
      "leisure":         { "contact_intensity": 0.20, "dwell_days": 0.1 },
      "retirement_home": { "contact_intensity": 0.30, "dwell_days": 0.8, "density_exponent": 0.0 }
    }
  },
  "mobility": { "leisure_fraction": 0.3 },
  "testing": {
    "start_day": 3.0,
    "symptomatic_probability": 0.6, "random_probability": 0.02,
    "sensitivity": 0.85, "specificity": 0.98, "flu_false_positive": 0.05,
    "result_delay_days": 1.0, "retest_interval_days": 5.0,
    "states": { "awaiting": "awaiting", "positive": "positive", "negative": "negative" },
    "switch": { "day": 40.0, "symptomatic_probability": 0.9, "random_probability": 0.05 }
  },
  "tracing": {
    "window_days": 5.0, "compliance": 0.8,
    "max_contacts": { "household": 4, "workplace": 3, "school": 3, "hospital": 2, "transit": 2, "leisure": 2 },
    "quarantine_state": "quarantined", "employee_quarantine_state": "on_leave"
  },
  "vaccination": {
    "start_day": 14.0, "doses_per_step": 2, "max_total": 40, "min_age": 12,
    "priority": [ { "residence": "retirement_home" }, { "kind": "hospital_employee" }, { "min_age": 60 } ],
    "dose_state": "vaccinated",
    "products": [
      { "name": "mrna_a", "share": 0.7,
        "susceptibility": { "points": [[0, 0], [14, 0.85], [120, 0.85], [300, 0.1]] },
        "transmission":   { "points": [[0, 0], [14, 0.5], [120, 0.5], [300, 0.05]] },
        "severity":       { "points": [[0, 0], [14, 0.9], [120, 0.9], [300, 0.4]] } },
      { "name": "vector_b", "share": 0.3,
        "susceptibility": { "points": [[0, 0], [21, 0.7], [100, 0.7], [250, 0.05]] },
        "transmission":   { "points": [[0, 0], [21, 0.4], [100, 0.4], [250, 0.0]] },
        "severity":       { "points": [[0, 0], [21, 0.85], [100, 0.85], [250, 0.3]] } }
    ],
    "booster": { "after_days": 45.0, "max": 1, "state": "boosted",
                 "ramp_days": 7.0, "plateau_days": 60.0, "waning_days": 120.0 },
    "initial": { "count": 4, "offset_days": [20.0, 90.0] }
  },
  "events": [
    { "day": 30, "name": "school closure", "contact_scale": { "school": 0.0 } },
    { "day": 35, "name": "lockdown",
      "contact_scale": { "workplace": 0.3, "leisure": 0.2, "transit": 0.3 },
      "leisure_fraction_scale": 0.2 },
    { "day": 60, "name": "reopening",
      "contact_scale": { "school": 1.0, "workplace": 0.7, "leisure": 1.0, "transit": 0.7 },
      "leisure_fraction_scale": 1.0 }
  ],
  "initial_infections": 1,
  "infectiousness_variability": 2.0
}"#;
