use abm_core::{AgentId, PlaceId};
use abm_population::PlaceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobilityError {
    /// An agent's fallback location is itself full.
    #[error("{kind} {place} is full and {agent} has nowhere to fall back to")]
    CapacityExceeded {
        place: PlaceId,
        kind:  PlaceKind,
        agent: AgentId,
    },

    #[error("mobility configuration error: {0}")]
    Config(String),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
