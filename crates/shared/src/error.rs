//! Application-wide error types.
//!
//! Every domain error in the workspace reports an [`ErrorKind`]. At the service
//! boundary they are flattened into an [`AppError`], which is what an external
//! router or worker hands back to its caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Error categories shared by all ledger components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before any mutation; safe to correct and retry.
    Validation,
    /// Referenced account, product, entry, document or rate does not exist.
    NotFound,
    /// Concurrent access conflict; retry the whole operation.
    Conflict,
    /// Ledger invariant violated; report to an operator, never auto-correct.
    Consistency,
    /// Unexpected failure (overflow, collaborator outage).
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code an external router should use.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 422,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Consistency | Self::Internal => 500,
        }
    }

    /// Returns true if the whole operation may simply be retried.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Boundary error: a categorised, serializable view of any domain error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Error category.
    pub kind: ErrorKind,
    /// Stable machine-readable code (e.g. `UNBALANCED_ENTRY`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl AppError {
    /// Creates a boundary error.
    #[must_use]
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "INTERNAL_ERROR", message)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &str {
        &self.code
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
