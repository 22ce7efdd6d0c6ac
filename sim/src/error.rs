use locomotion::LocomotionError;
use thiserror::Error;

pub type Result<T, E = SimError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Locomotion(#[from] LocomotionError),

    #[error("Failed to parse simulation file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to read simulation file: {0}")]
    Io(#[from] std::io::Error),
}
