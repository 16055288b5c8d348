use thiserror::Error;

use abm_core::{AgentId, PlaceId};

use crate::PlaceKind;

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("place ids must be 0..n in order: row {row} has id {id}")]
    PlaceOrder { row: usize, id: u32 },

    #[error("agent ids must be 0..n in order: row {row} has id {id}")]
    AgentOrder { row: usize, id: u32 },

    #[error("agent {agent}: {field} references unknown place {place}")]
    UnknownPlace {
        agent: AgentId,
        field: &'static str,
        place: u32,
    },

    #[error("agent {agent}: {field} references {place} of kind {kind}")]
    WrongPlaceKind {
        agent: AgentId,
        field: &'static str,
        place: PlaceId,
        kind:  PlaceKind,
    },

    #[error("agent {agent}: missing required {field}")]
    MissingAssignment {
        agent: AgentId,
        field: &'static str,
    },

    #[error("{place} has {assigned} assigned agents but capacity {capacity}")]
    CapacityExceeded {
        place:    PlaceId,
        assigned: u32,
        capacity: u32,
    },

    #[error("invalid population parameter: {0}")]
    Config(String),
}

pub type PopulationResult<T> = Result<T, PopulationError>;
