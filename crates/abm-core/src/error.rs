//! Base error type.
//!
//! Sub-crates define their own error enums and wrap `AbmError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::{AgentId, PlaceId};

#[derive(Debug, Error)]
pub enum AbmError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("place {0} not found")]
    PlaceNotFound(PlaceId),

    #[error("malformed transition function: {0}")]
    MalformedCurve(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `abm-core`.
pub type AbmResult<T> = Result<T, AbmError>;
