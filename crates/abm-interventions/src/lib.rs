//! `abm-interventions`: policies layered on top of the disease model.
//!
//! | Module          | Contents                                                         |
//! |-----------------|------------------------------------------------------------------|
//! | [`testing`]     | `Testing`, `TestingParams`, `TestingSwitch`, `TestDecision`      |
//! | [`vaccination`] | `Vaccination`, `VaccinationParams`, priority groups, boosters    |
//! | [`tracing`]     | `ContactTracing`, `TracingParams`, `TraceOutcome`                |
//! | [`error`]       | `InterventionError`, `InterventionResult`                        |
//!
//! Every intervention writes state through the `TransitionsManager`, so
//! coupling rules fire and scheduled transitions are redrawn exactly as for
//! disease progression.
//!
//! # Feature flags
//!
//! | Feature   | Effect                                                  |
//! |-----------|---------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for the tracing case maps     |

pub mod error;
pub mod testing;
pub mod tracing;
pub mod vaccination;

#[cfg(test)]
mod tests;

pub use error::{InterventionError, InterventionResult};
pub use testing::{
    TestDecision, TestOutcome, Testing, TestingParams, TestingStates, TestingStats, TestingStep, TestingSwitch,
};
pub use tracing::{Contact, ContactTracing, TraceOutcome, TracingParams};
pub use vaccination::{
    BoosterParams, InitialVaccinations, PriorityGroup, ProductSpec, Vaccination, VaccinationCtx,
    VaccinationParams,
};
