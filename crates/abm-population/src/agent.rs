//! Per-agent attribute types.

use std::fmt;

use serde::{Deserialize, Serialize};

use abm_core::{Category, ProductId, TransitionFunction};

/// Population subtype.  Selects the states-manager and transitions-manager
/// variants that govern the agent.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    #[default]
    Regular,
    HospitalEmployee,
    HospitalPatient,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentKind::Regular          => "regular",
            AgentKind::HospitalEmployee => "hospital_employee",
            AgentKind::HospitalPatient  => "hospital_patient",
        })
    }
}

/// Optional initial state names per category, resolved against the taxonomy
/// when the simulation is built.  `None` means the category's initial value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitialStates {
    pub names: [Option<String>; Category::COUNT],
}

impl InitialStates {
    pub fn get(&self, category: Category) -> Option<&str> {
        self.names[category.index()].as_deref()
    }

    pub fn with(mut self, category: Category, name: &str) -> Self {
        self.names[category.index()] = Some(name.to_owned());
        self
    }
}

/// One agent as described by the population input, before validation.
///
/// Place references are raw `u32`s here; [`PopulationBuilder`] checks that
/// each one exists and has a kind compatible with the reference.
///
/// [`PopulationBuilder`]: crate::PopulationBuilder
#[derive(Clone, Debug, Default)]
pub struct AgentRecord {
    pub kind:            AgentKind,
    pub age:             u8,
    pub household:       Option<u32>,
    pub school:          Option<u32>,
    pub work:            Option<u32>,
    pub hospital:        Option<u32>,
    pub transit:         Option<u32>,
    pub works_from_home: bool,
    /// Relative susceptibility; `None` means 1.0.
    pub susceptibility:  Option<f64>,
    pub initial:         InitialStates,
}

/// Vaccine-induced protection held by one agent.
///
/// All three curves are in absolute simulated days (already shifted to the
/// dose time) and give the fractional reduction in [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct Protection {
    pub product:        ProductId,
    pub doses:          u8,
    pub dosed_at_days:  f64,
    pub susceptibility: TransitionFunction,
    pub transmission:   TransitionFunction,
    pub severity:       TransitionFunction,
}

impl Protection {
    #[inline]
    pub fn susceptibility_reduction(&self, day: f64) -> f64 {
        self.susceptibility.value_at(day).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn transmission_reduction(&self, day: f64) -> f64 {
        self.transmission.value_at(day).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn severity_reduction(&self, day: f64) -> f64 {
        self.severity.value_at(day).clamp(0.0, 1.0)
    }
}
