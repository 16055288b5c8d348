use abm_core::AbmError;
use abm_states::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterventionError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Curve(#[from] AbmError),

    #[error("{section} configuration error: {detail}")]
    Config { section: &'static str, detail: String },
}

impl InterventionError {
    pub(crate) fn config(section: &'static str, detail: impl Into<String>) -> Self {
        InterventionError::Config { section, detail: detail.into() }
    }
}

pub type InterventionResult<T> = Result<T, InterventionError>;
