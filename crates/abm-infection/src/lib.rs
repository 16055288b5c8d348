//! `abm-infection`: turning co-presence into new infections.
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`model`]   | `InfectionModel`, `InfectionParams`, `KindParams`, `InfectionCtx` |
//! | [`error`]   | `InfectionError`, `InfectionResult`                             |
//!
//! # Feature flags
//!
//! | Feature    | Effect                                                       |
//! |------------|--------------------------------------------------------------|
//! | `parallel` | Place contributions and per-agent draws run on Rayon         |
//!
//! Results do not depend on the feature: every agent draws from its own RNG
//! and infections are written in ascending agent id.

pub mod error;
pub mod model;


pub use error::{InfectionError, InfectionResult};
pub use model::{InfectionCtx, InfectionModel, InfectionParams, KindParams};
