//! Error types for actuator operations.

use thiserror::Error;

/// Result type alias for actuator operations.
pub type ActuatorResult<T> = Result<T, ActuatorError>;

/// Errors reported by an actuator. None of them are fatal to the watchdog.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("RF transmitter not available")]
    Unavailable,

    #[error("failed to start transmitter '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("transmitter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("transmission timed out after {0:?}")]
    Timeout(std::time::Duration),
}
