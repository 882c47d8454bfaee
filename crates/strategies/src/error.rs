use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("An error occurred during indicator calculation: {0}")]
    IndicatorError(String),

    #[error("Strategy '{0}' not found")]
    NotFound(Uuid),

    #[error("Strategy '{0}' is enabled; stop it before changing its parameters")]
    EnabledStrategyImmutable(Uuid),
}
