use abm_infection::InfectionError;
use abm_interventions::InterventionError;
use abm_mobility::MobilityError;
use abm_population::PopulationError;
use abm_states::StateError;
use abm_transitions::TransitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("cannot read parameters: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Mobility(#[from] MobilityError),

    #[error(transparent)]
    Infection(#[from] InfectionError),

    #[error(transparent)]
    Intervention(#[from] InterventionError),
}

pub type SimResult<T> = Result<T, SimError>;
