//! `abm-sim`: parameters, the per-step pipeline and run reporting.
//!
//! # Per-step pipeline
//!
//! ```text
//! for tick in 0..simulation.total_ticks:
//!   ⓪ Events      : fire scheduled closures and phases, apply the
//!                   leisure reopening ramp.
//!   ① Mobility    : place every living agent for each slot; overflow
//!                   policy at full places.
//!   ② Infection   : λ per occupied place, one draw per susceptible agent.
//!   ③ Transitions : apply every due transition (priority on ties), then
//!                   the seasonal-flu overlay.
//!   ④ Testing     : select and test, write results that came due.
//!   ⑤ Vaccination : this step's doses, by priority group.
//!   ⑥ Tracing     : record contacts, trace this step's confirmed cases.
//!   ⑦ Snapshot    : StepSnapshot to the observer; clock advances.
//! ```
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`params`]   | `SimParams`: JSON loading and range validation            |
//! | [`builder`]  | `SimBuilder`                                              |
//! | [`sim`]      | `Sim`: `run`, `run_ticks`, `step`                         |
//! | [`timeline`] | `Timeline`, `ScheduledEvent`, `LeisureReopening`          |
//! | [`snapshot`] | `StepSnapshot`                                            |
//! | [`report`]   | `RunReport`                                               |
//! | [`observer`] | `SimObserver`, `NoopObserver`, `SnapshotRecorder`         |
//! | [`error`]    | `SimError`, `SimResult`                                   |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Rayon for exposure and due-transition scans; sizes the     |
//! |            | global pool from `simulation.num_threads`.                 |
//! | `fx-hash`  | FxHash for the contact-tracing maps.                       |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use abm_population::{load_agents_csv, load_places_csv};
//! use abm_sim::{NoopObserver, SimBuilder, SimParams};
//!
//! let params = SimParams::load_json(Path::new("params.json"))?;
//! let mut sim = SimBuilder::new(params)
//!     .places(load_places_csv(Path::new("places.csv"))?)
//!     .agents(load_agents_csv(Path::new("agents.csv"))?)
//!     .build()?;
//! let report = sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod params;
pub mod report;
pub mod sim;
pub mod snapshot;
pub mod timeline;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, SnapshotRecorder};
pub use params::SimParams;
pub use report::RunReport;
pub use sim::Sim;
pub use snapshot::StepSnapshot;
pub use timeline::{LeisureReopening, ScheduledEvent, Timeline};
