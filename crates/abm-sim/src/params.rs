//! The complete parameter set of one run, as loaded from JSON.
//!
//! ```json
//! {
//!   "simulation":  { "total_ticks": 120, "step_days": 1.0, "seed": 42 },
//!   "taxonomy":    { "health": { ... }, "role": { ... }, ... },
//!   "states":      { "regular": { "edges": { ... }, "coupling": [ ... ] } },
//!   "transitions": { "regular": [ ... ] },
//!   "infection":   { "on_infection": "exposed", "places": { ... } },
//!   "initial_infections": 5
//! }
//! ```
//!
//! `flu`, `mobility`, `testing`, `vaccination`, `tracing`, `events` and
//! `leisure_reopening` are optional.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use abm_core::SimConfig;
use abm_infection::InfectionParams;
use abm_interventions::{TestingParams, TracingParams, VaccinationParams};
use abm_mobility::MobilityParams;
use abm_states::{StatesSpec, TaxonomySpec};
use abm_transitions::{FluParams, TransitionsSpec};

use crate::timeline::{self, LeisureReopening, ScheduledEvent};
use crate::{SimError, SimResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimParams {
    pub simulation:  SimConfig,
    pub taxonomy:    TaxonomySpec,
    pub states:      StatesSpec,
    #[serde(default)]
    pub transitions: TransitionsSpec,
    #[serde(default)]
    pub flu:         Option<FluParams>,
    pub infection:   InfectionParams,
    #[serde(default)]
    pub mobility:    MobilityParams,
    #[serde(default)]
    pub testing:     Option<TestingParams>,
    #[serde(default)]
    pub vaccination: Option<VaccinationParams>,
    #[serde(default)]
    pub tracing:     Option<TracingParams>,

    /// Closures, lockdown and reopening phases.
    #[serde(default)]
    pub events:            Vec<ScheduledEvent>,
    #[serde(default)]
    pub leisure_reopening: Option<LeisureReopening>,

    /// Susceptible agents infected on tick 0, drawn by the simulation RNG.
    #[serde(default)]
    pub initial_infections: u32,

    /// Gamma shape of per-agent infectiousness variability (mean 1);
    /// `None` gives every agent 1.0.
    #[serde(default)]
    pub infectiousness_variability: Option<f64>,
}

fn probability(what: &str, p: f64) -> SimResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(SimError::Config(format!("{what} {p} is not a probability")))
    }
}

fn non_negative(what: &str, v: f64) -> SimResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(SimError::Config(format!("{what} must be a non-negative number, got {v}")))
    }
}

impl SimParams {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let params: SimParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> SimResult<Self> {
        let params: SimParams = serde_json::from_reader(reader)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load_json(path: &Path) -> SimResult<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    /// Range checks that do not need the taxonomy.  State names and edge
    /// tables are checked when the simulation is built.
    pub fn validate(&self) -> SimResult<()> {
        let sim = &self.simulation;
        if !(sim.step_days.is_finite() && sim.step_days > 0.0) {
            return Err(SimError::Config(format!(
                "simulation.step_days must be positive, got {}",
                sim.step_days
            )));
        }
        if sim.num_threads == Some(0) {
            return Err(SimError::Config("simulation.num_threads must be at least 1".into()));
        }
        if self.transitions.category_priority.is_empty() {
            return Err(SimError::Config("transitions.category_priority is empty".into()));
        }
        if let Some(shape) = self.infectiousness_variability {
            if !(shape.is_finite() && shape > 0.0) {
                return Err(SimError::Config(format!(
                    "infectiousness_variability must be a positive Gamma shape, got {shape}"
                )));
            }
        }
        if let Some(flu) = &self.flu {
            probability("flu.fraction", flu.fraction)?;
            non_negative("flu.start_day", flu.start_day)?;
            if !(flu.duration_days.is_finite() && flu.duration_days > 0.0) {
                return Err(SimError::Config("flu.duration_days must be positive".into()));
            }
        }
        probability("mobility.leisure_fraction", self.mobility.leisure_fraction)?;
        if let Some(testing) = &self.testing {
            testing.validate()?;
            non_negative("testing.start_day", testing.start_day)?;
        }
        if let Some(v) = &self.vaccination {
            non_negative("vaccination.start_day", v.start_day)?;
            if v.products.is_empty() {
                return Err(SimError::Config("vaccination.products is empty".into()));
            }
            if v.doses_per_step == 0 {
                log::warn!("vaccination.doses_per_step is 0; no doses will be given");
            }
        }
        timeline::validate(&self.events, self.leisure_reopening.as_ref())?;
        if let Some(t) = &self.tracing {
            non_negative("tracing.window_days", t.window_days)?;
            probability("tracing.compliance", t.compliance)?;
            if t.max_contacts.is_empty() {
                log::warn!("tracing.max_contacts is empty; no contacts will be recorded");
            }
        }
        Ok(())
    }
}
