//! `abm-transitions`: what happens next, and when.
//!
//! Every category of every agent has at most one pending transition
//! `(target, due tick)`, sampled from a rule when the current value was
//! entered.  [`TransitionsManager::advance`] applies what is due each step;
//! [`TransitionsManager::transition`] is the only way any subsystem
//! (infection, testing, vaccination, tracing) changes an agent's state.
//!
//! | Module       | Contents                                                       |
//! |--------------|----------------------------------------------------------------|
//! | [`rules`]    | `TransitionsSpec`, `RuleSpec`, `DurationSpec`, `ManagerKind`   |
//! | [`manager`]  | `TransitionsManager`, `TransitionCtx`, `Scheduled`             |
//! | [`flu`]      | `SeasonalFlu`, `FluParams`, `FluStatus`                        |
//! | [`error`]    | `TransitionError`, `TransitionResult`                          |
//!
//! # Feature flags
//!
//! | Feature    | Effect                                              |
//! |------------|-----------------------------------------------------|
//! | `parallel` | Scan for due agents with Rayon                      |

pub mod error;
pub mod flu;
pub mod manager;
pub mod rules;

#[cfg(test)]
mod tests;

pub use error::{TransitionError, TransitionResult};
pub use flu::{FluParams, FluStatus, SeasonalFlu};
pub use manager::{Scheduled, TransitionCtx, TransitionsManager};
pub use rules::{BranchSpec, DurationSpec, ManagerKind, RuleSpec, TransitionsSpec};
