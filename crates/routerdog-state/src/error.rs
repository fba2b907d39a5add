//! Error types for the cooldown store.

use thiserror::Error;

/// Result type alias for cooldown store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or writing the cooldown record.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("corrupt cooldown record: {0}")]
    Corrupt(String),
}
