//! `abm-mobility`: where every agent is during a step.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`slot`]        | `Slot` (home / commute / daytime / leisure), `PlaceSet`     |
//! | [`occupancy`]   | `Occupancy`: per-place occupant lists for one step          |
//! | [`mobility`]    | `Mobility`, `MobilityParams`, `OverflowPolicy`              |
//! | [`error`]       | `MobilityError`, `MobilityResult<T>`                        |
//!
//! # Placement model
//!
//! A step is split into slots.  [`Mobility::place_for`] says which places an
//! agent wants in each slot given its kind and current state:
//!
//! 1. Dead agents are nowhere.
//! 2. Hospital patients and hospitalized agents are at their hospital.
//! 3. Isolated agents (home isolation, quarantine, leave) are at home.
//! 4. Everyone else is at home, at school and/or work in the daytime (unless
//!    working from home), on their transit when they go somewhere, and at a
//!    random leisure place with probability `leisure_fraction` unless they
//!    present symptoms.
//!
//! [`Mobility::place_all`] turns those wishes into an [`Occupancy`] that
//! never exceeds any capacity, applying the kind's [`OverflowPolicy`] to
//! arrivals at full places.

pub mod error;
pub mod mobility;
pub mod occupancy;
pub mod slot;


pub use error::{MobilityError, MobilityResult};
pub use mobility::{Mobility, MobilityCtx, MobilityParams, OverflowPolicy};
pub use occupancy::{Full, Occupancy};
pub use slot::{PlaceSet, Slot};
