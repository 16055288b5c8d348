use abm_states::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfectionError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("infection configuration error: {0}")]
    Config(String),
}

pub type InfectionResult<T> = Result<T, InfectionError>;
