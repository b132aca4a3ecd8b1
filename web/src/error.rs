//! HTTP rendering of [`QueryError`].
//!
//! Every failure leaves the service as a JSON body
//! `{ "code": ..., "message": ... }` with a status chosen by the error kind:
//!
//! ```text
//! UnsupportedPagination  400  UNSUPPORTED_PAGINATION
//! ValidationFailed       422  VALIDATION_ERROR
//! NotFound               404  NOT_FOUND
//! StoreUnavailable       503  SERVICE_UNAVAILABLE
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use order_query_core::QueryError;
use serde::Serialize;
use std::fmt;

/// A [`QueryError`] on its way to the client.
///
/// Store failures keep the driver message in the log only; the client sees
/// a fixed text.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    source: QueryError,
}

impl AppError {
    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<QueryError> for AppError {
    fn from(source: QueryError) -> Self {
        let (status, code, message) = match &source {
            QueryError::UnsupportedPagination { .. } => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_PAGINATION",
                source.to_string(),
            ),
            QueryError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", source.to_string()),
            QueryError::ValidationFailed(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                message.clone(),
            ),
            QueryError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Order store is unavailable".to_string(),
            ),
        };

        Self {
            status,
            code,
            message,
            source,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.source.is_client_error() {
            tracing::debug!(status = %self.status, code = self.code, error = %self.source, "Request rejected");
        } else {
            tracing::error!(status = %self.status, code = self.code, error = %self.source, "Request failed");
        }

        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_query_core::FetchStrategy;

    #[test]
    fn test_unsupported_pagination_is_bad_request() {
        let err = AppError::from(QueryError::UnsupportedPagination {
            strategy: FetchStrategy::FetchJoinGraph,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "[UNSUPPORTED_PAGINATION] Strategy fetch-join-graph does not support offset/limit pagination"
        );
    }

    #[test]
    fn test_not_found() {
        let err = AppError::from(QueryError::not_found("order", 7));
        assert_eq!(err.to_string(), "[NOT_FOUND] order with id 7 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_keeps_the_bare_message() {
        let err = AppError::from(QueryError::validation("offset must not be negative"));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] offset must not be negative");
    }

    #[test]
    fn test_store_failure_hides_driver_message() {
        let err = AppError::from(QueryError::StoreUnavailable(
            "connection refused".to_string(),
        ));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "SERVICE_UNAVAILABLE");
        assert!(!err.to_string().contains("refused"));

        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Store unavailable: connection refused"));
    }

    #[tokio::test]
    async fn test_response_body() {
        let response = AppError::from(QueryError::not_found("order", 3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "order with id 3 not found");
    }
}
