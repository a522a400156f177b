//! Engine Error Types

use thiserror::Error;
use uuid::Uuid;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the intake and queue layer
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// `ignore` referenced a history entry that does not exist
    #[error("no history entry with id {0}")]
    UnknownHistoryEntry(Uuid),

    /// Generic engine operation error
    #[error("engine operation failed: {message}")]
    OperationFailed { message: String },
}

impl EngineError {
    /// Create an operation failed error
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
        }
    }
}
