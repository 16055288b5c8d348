use thiserror::Error;

use abm_states::StateError;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("transition rule error ({variant}): {detail}")]
    Rule { variant: &'static str, detail: String },

    #[error("transitions configuration error: {0}")]
    Config(String),
}

pub type TransitionResult<T> = Result<T, TransitionError>;
