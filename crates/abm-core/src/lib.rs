//! `abm-core`: foundational types for the `rust_abm` epidemic engine.
//!
//! This crate is a dependency of every other `abm-*` crate and has no
//! `abm-*` dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `PlaceId`, `StateValue`, `ProductId`            |
//! | [`category`]    | `Category`: the four independent state dimensions          |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                            |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (global)                  |
//! | [`curve`]       | `TransitionFunction`: three/four-segment piecewise curves  |
//! | [`param`]       | `Param`, `CurveInput`: constants or curves over an input   |
//! | [`audit`]       | `AuditLog`, `AuditEvent`: recoverable-fault ledger         |
//! | [`error`]       | `AbmError`, `AbmResult`                                    |

pub mod audit;
pub mod category;
pub mod curve;
pub mod error;
pub mod ids;
pub mod param;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use audit::{AuditEvent, AuditKind, AuditLog};
pub use category::Category;
pub use curve::{Evaluated, Interpolation, TransitionFunction};
pub use error::{AbmError, AbmResult};
pub use ids::{AgentId, PlaceId, ProductId, StateValue};
pub use param::{CurveInput, CurveInputs, Param};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, SimConfig, Tick};
