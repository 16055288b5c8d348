//! Scheduled policy changes: closures, lockdown and reopening phases, and a
//! gradual reopening of leisure venues.
//!
//! ```json
//! "events": [
//!   { "day": 20, "name": "school closure", "contact_scale": { "school": 0.0 } },
//!   { "day": 25, "name": "lockdown",
//!     "contact_scale": { "workplace": 0.3, "leisure": 0.3, "transit": 0.3 },
//!     "leisure_fraction_scale": 0.3 },
//!   { "day": 60, "name": "phase 1",
//!     "contact_scale": { "workplace": 0.6, "leisure": 0.6, "transit": 0.6 },
//!     "leisure_fraction_scale": 0.6 }
//! ],
//! "leisure_reopening": { "start_day": 90, "initial_scale": 0.6, "rate_per_day": 0.05 }
//! ```
//!
//! Scales are relative to the configured baseline, not to the previous
//! event, and a kind keeps its last scale until an event names it again.
//! An event fires on the first step whose day is at or past its `day`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use abm_infection::InfectionModel;
use abm_mobility::Mobility;
use abm_population::PlaceKind;

use crate::{SimError, SimResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub day:                    f64,
    #[serde(default)]
    pub name:                   Option<String>,
    /// Contact-intensity scale per kind; 0 closes the kind.
    #[serde(default)]
    pub contact_scale:          HashMap<PlaceKind, f64>,
    /// Scale of `mobility.leisure_fraction`.
    #[serde(default)]
    pub leisure_fraction_scale: Option<f64>,
}

/// Linear reopening of leisure venues: both their contact intensity and the
/// leisure fraction rise from `initial_scale` to 1, closing `rate_per_day`
/// of the gap each day from `start_day`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeisureReopening {
    #[serde(default)]
    pub start_day:     f64,
    pub initial_scale: f64,
    pub rate_per_day:  f64,
}

impl LeisureReopening {
    pub fn scale_at(&self, day: f64) -> f64 {
        if day < self.start_day {
            return self.initial_scale;
        }
        let gap = 1.0 - self.initial_scale;
        (self.initial_scale + self.rate_per_day * gap * (day - self.start_day)).min(1.0)
    }
}

fn scale_ok(what: &str, v: f64) -> SimResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(SimError::Config(format!("{what} must be a non-negative number, got {v}")))
    }
}

pub(crate) fn validate(events: &[ScheduledEvent], reopening: Option<&LeisureReopening>) -> SimResult<()> {
    for e in events {
        scale_ok("events[].day", e.day)?;
        for (kind, &v) in &e.contact_scale {
            scale_ok(&format!("events[].contact_scale.{kind}"), v)?;
        }
        if let Some(v) = e.leisure_fraction_scale {
            scale_ok("events[].leisure_fraction_scale", v)?;
        }
    }
    if let Some(r) = reopening {
        scale_ok("leisure_reopening.start_day", r.start_day)?;
        scale_ok("leisure_reopening.rate_per_day", r.rate_per_day)?;
        if !(0.0..=1.0).contains(&r.initial_scale) {
            return Err(SimError::Config(format!(
                "leisure_reopening.initial_scale {} must lie in [0, 1]",
                r.initial_scale
            )));
        }
    }
    Ok(())
}

/// Applies the event timeline and the reopening ramp at the start of each
/// step.
pub struct Timeline {
    events:        Vec<ScheduledEvent>,
    next:          usize,
    kind_scale:    [f64; PlaceKind::COUNT],
    leisure_scale: f64,
    reopening:     Option<LeisureReopening>,
}

impl Timeline {
    pub fn new(mut events: Vec<ScheduledEvent>, reopening: Option<LeisureReopening>) -> Self {
        events.sort_by(|a, b| a.day.total_cmp(&b.day));
        Self {
            events,
            next: 0,
            kind_scale: [1.0; PlaceKind::COUNT],
            leisure_scale: 1.0,
            reopening,
        }
    }

    /// Events not yet fired.
    pub fn pending(&self) -> usize {
        self.events.len() - self.next
    }

    /// Current contact scale of `kind` from events alone.
    pub fn kind_scale(&self, kind: PlaceKind) -> f64 {
        self.kind_scale[kind.index()]
    }

    /// Fire every event due by `day` and push the resulting scales into the
    /// infection model and mobility.  Returns the number of events fired.
    pub fn apply(&mut self, day: f64, infection: &mut InfectionModel, mobility: &mut Mobility) -> usize {
        let mut fired = 0;
        while let Some(e) = self.events.get(self.next) {
            if e.day > day {
                break;
            }
            for (&kind, &v) in &e.contact_scale {
                self.kind_scale[kind.index()] = v;
            }
            if let Some(v) = e.leisure_fraction_scale {
                self.leisure_scale = v;
            }
            log::info!("day {day:.1}: {}", e.name.as_deref().unwrap_or("scheduled event"));
            self.next += 1;
            fired += 1;
        }

        let ramp = self.reopening.as_ref().map_or(1.0, |r| r.scale_at(day));
        for kind in PlaceKind::ALL {
            let mut scale = self.kind_scale[kind.index()];
            if kind == PlaceKind::Leisure {
                scale *= ramp;
            }
            infection.set_contact_scale(kind, scale);
        }
        mobility.set_leisure_scale(self.leisure_scale * ramp);
        fired
    }
}
