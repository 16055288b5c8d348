use std::fmt;

use thiserror::Error;

use abm_core::{AgentId, Category};

/// Why a requested state write was refused.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TransitionFault {
    /// The edge `from → to` is not in the category's edge table.
    EdgeNotPermitted,
    /// The write is timestamped before the category's last change.
    TimeRegression,
    /// A coupling rule forced a write whose edge is not permitted.
    CouplingEdgeNotPermitted,
    /// Two coupling rules forced different values into one category.
    ConflictingCoupling,
}

impl fmt::Display for TransitionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransitionFault::EdgeNotPermitted         => "edge not permitted",
            TransitionFault::TimeRegression           => "time earlier than last transition",
            TransitionFault::CouplingEdgeNotPermitted => "coupled edge not permitted",
            TransitionFault::ConflictingCoupling      => "conflicting coupling rules",
        })
    }
}

#[derive(Debug, Error)]
pub enum StateError {
    /// Recoverable: the transition is dropped and audited.
    #[error("invalid {category} transition for {agent}: {from} -> {to} ({fault})")]
    InvalidTransition {
        agent:    AgentId,
        category: Category,
        from:     String,
        to:       String,
        fault:    TransitionFault,
    },

    #[error("unknown {category} state {name:?}")]
    UnknownState { category: Category, name: String },

    #[error("state configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },
}

impl StateError {
    /// `true` for the recoverable mid-run condition, `false` for
    /// configuration-integrity faults.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StateError::InvalidTransition { .. })
    }
}

pub type StateResult<T> = Result<T, StateError>;
