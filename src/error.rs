//! Error types shared by the board engine.

use std::fmt;

use crate::model::TaskId;

/// Error type returned by port implementations.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by board operations.
#[derive(Debug)]
pub enum BoardError {
    /// Caught before dispatch; no remote call was made.
    Validation(String),
    /// A remote call failed. The cache was left in its pre-mutation state.
    Mutation {
        /// What was being attempted (e.g. "move task").
        operation: &'static str,
        /// The underlying port error, rendered.
        message: String,
    },
    /// Loading rows from the store failed.
    Fetch(String),
    /// The task is not in the current cached list.
    NotFound(TaskId),
    /// The undo stack is empty.
    NothingToUndo,
    /// Invalid or missing configuration.
    Config(String),
}

impl BoardError {
    /// Wraps a port error as a mutation failure.
    pub fn mutation(operation: &'static str, err: &PortError) -> Self {
        BoardError::Mutation { operation, message: err.to_string() }
    }
}

impl From<PortError> for BoardError {
    fn from(err: PortError) -> Self {
        BoardError::Fetch(err.to_string())
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::Validation(msg) => write!(f, "invalid request: {msg}"),
            BoardError::Mutation { operation, message } => {
                write!(f, "failed to {operation}: {message}")
            }
            BoardError::Fetch(msg) => write!(f, "failed to load board: {msg}"),
            BoardError::NotFound(id) => write!(f, "task {id} not found"),
            BoardError::NothingToUndo => f.write_str("nothing to undo"),
            BoardError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<BoardError> for String {
    fn from(err: BoardError) -> Self {
        err.to_string()
    }
}
