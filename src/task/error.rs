//! Task error types

use thiserror::Error;

/// A failed precondition check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PreconditionViolation {
    /// Human readable description of the broken precondition
    pub message: String,
}

/// Error types for task construction and consumption.
///
/// These never carry a task's own failure value: domain failures travel
/// through the ERROR signal as the task's `E` payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// A source or operator was started with a request other than START
    #[error("Protocol violation: {0}")]
    ProtocolViolation(#[from] PreconditionViolation),

    /// The awaited run was cancelled before it settled
    #[error("Task run cancelled")]
    Cancelled,

    /// The run went away without settling or being cancelled
    #[error("Task run abandoned before it settled")]
    Abandoned,
}

/// Convenience result alias for task operations
pub type TaskResult<T> = Result<T, TaskError>;
