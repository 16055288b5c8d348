//! `abm-population`: agents and places for the `rust_abm` engine.
//!
//! Agents and places are built once from validated input and live for the
//! whole run.  They refer to each other only through ids: an agent holds the
//! `PlaceId`s it is assigned to, a place never holds agents (who is present
//! during a step is the mobility `Occupancy`'s business).
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`agent`]     | `AgentKind`, `AgentRecord`, `InitialStates`, `Protection`     |
//! | [`place`]     | `PlaceKind`, `Place`, `PlaceStore`, `TransmissionParams`      |
//! | [`store`]     | `AgentStore` (SoA arrays), `AgentRngs` (per-agent RNG)        |
//! | [`builder`]   | `PopulationBuilder` → validated `Population`                  |
//! | [`loader`]    | `load_places_csv`, `load_agents_csv` (+ reader variants)      |
//! | [`error`]     | `PopulationError`, `PopulationResult`                         |

pub mod agent;
pub mod builder;
pub mod error;
pub mod loader;
pub mod place;
pub mod store;

#[cfg(test)]
mod tests;

pub use agent::{AgentKind, AgentRecord, InitialStates, Protection};
pub use builder::{Population, PopulationBuilder};
pub use error::{PopulationError, PopulationResult};
pub use loader::{load_agents_csv, load_agents_reader, load_places_csv, load_places_reader};
pub use place::{Place, PlaceKind, PlaceStore, TransmissionParams};
pub use store::{AgentRngs, AgentStore};
