/// Common error types for the Workboard domain core
///
/// Every operation in the query engine and the mutation services returns
/// `CoreResult<T>`. The variants are deliberately coarse: they classify the
/// outcome for the caller (the API layer maps each variant to an HTTP
/// status) without leaking storage details.
use thiserror::Error;

/// Result alias used throughout the domain core
pub type CoreResult<T> = Result<T, CoreError>;

/// Domain error classification
///
/// # Variants
///
/// - `Validation`: malformed or missing input (bad date string, empty
///   title, unknown role, ...)
/// - `Forbidden`: the actor is authenticated but not allowed to perform
///   this operation on this target
/// - `NotFound`: a referenced task, user, or comment does not exist
/// - `Conflict`: the mutation would break a uniqueness or invariant rule
///   (duplicate email, removing the last admin)
/// - `Store`: unexpected persistence-layer failure
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    /// Holds the resource noun ("Task", "User", "Comment")
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    /// Infrastructure failure outside the store (e.g. password hashing)
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    /// True for the variants that indicate a caller mistake rather than a
    /// system failure. Useful when deciding what to log at which level.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Store(_) | CoreError::Internal(_))
    }
}
