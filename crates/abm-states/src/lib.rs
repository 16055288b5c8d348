//! `abm-states`: the composite per-agent state machine.
//!
//! Every agent carries exactly one [`StateValue`] per [`Category`].  The names
//! and behavioural traits of those values come from configuration
//! ([`Taxonomy`]); which value may follow which is an [`EdgeTable`] per
//! category and manager variant; cross-category side effects are an explicit
//! list of [`CouplingRule`]s applied inside the same write.
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`taxonomy`]  | `Trait`, `Traits`, `Taxonomy`, `TaxonomySpec`               |
//! | [`edges`]     | `EdgeTable`, `CouplingRule`, `StatesSpec`, `VariantSpec`    |
//! | [`manager`]   | `StatesManager`, `StatesVariant`, `Applied`, `Write`        |
//! | [`error`]     | `StateError`, `TransitionFault`, `StateResult`              |
//!
//! [`StateValue`]: abm_core::StateValue
//! [`Category`]: abm_core::Category

pub mod edges;
pub mod error;
pub mod manager;
pub mod taxonomy;


pub use edges::{CouplingRule, EdgeTable, StatesSpec, VariantSpec};
pub use error::{StateError, StateResult, TransitionFault};
pub use manager::{Applied, StatesManager, StatesVariant, Write};
pub use taxonomy::{CategorySpec, StateSpec, Taxonomy, TaxonomySpec, Trait, Traits};
