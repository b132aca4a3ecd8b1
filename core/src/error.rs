//! Error type shared by the store contract, the strategies and the facade.

use crate::strategy::FetchStrategy;
use thiserror::Error;

/// Errors surfaced by order queries.
///
/// Every variant is terminal for the request. No strategy returns a partial
/// result alongside an error.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Pagination was requested for a strategy whose root query is
    /// row-multiplied by a to-many join.
    ///
    /// Returned before any query executes.
    #[error("Strategy {strategy} does not support offset/limit pagination")]
    UnsupportedPagination {
        /// The strategy that was asked to paginate.
        strategy: FetchStrategy,
    },

    /// An identity lookup found nothing.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name (`"order"`, `"member"`, ...).
        entity: &'static str,
        /// The identity that was looked up.
        id: i64,
    },

    /// The persistence substrate failed (connectivity, timeout, query error).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Malformed criteria, pagination, configuration or a write-side rule
    /// violation.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl QueryError {
    /// Build a [`QueryError::NotFound`].
    #[must_use]
    pub const fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Build a [`QueryError::ValidationFailed`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }

    /// Whether the caller can fix the request and try again.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_))
    }
}

/// Result type for order query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
