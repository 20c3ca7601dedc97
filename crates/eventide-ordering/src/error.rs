//! Errors raised by order use cases.

use eventide_core::error::RepositoryError;
use thiserror::Error;

/// Failure of an order command or query.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The command is not valid for the order's current state.
    #[error("validation error: {0}")]
    Validation(String),

    /// Loading or saving the order failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
