use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = LocomotionError> = std::result::Result<T, E>;

/// Errors surfaced by the locomotion subsystem.
///
/// Missing ground contacts and degenerate ground normals are not errors: they are recovered
/// locally (see `ground` and `frame`). Gait invariant violations are programming faults and
/// are asserted rather than returned.
#[derive(Debug, Error)]
pub enum LocomotionError {
    #[error("Invalid value for {field}: {message}")]
    Configuration {
        field: &'static str,
        message: String,
    },

    #[error("Invalid timestep: {0} (must be finite and > 0)")]
    InvalidTimestep(f32),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LocomotionError {
    pub(crate) fn config(field: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            message: message.into(),
        }
    }
}

/// Reject a non-finite or non-positive timestep.
#[inline]
pub fn check_timestep(dt: f32) -> Result<f32> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(LocomotionError::InvalidTimestep(dt))
    }
}
