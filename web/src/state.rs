//! Application state for Axum handlers.

use order_query_core::{OrderQueries, OrderStore};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Wraps the query facade in an `Arc`, so cloning per request is cheap and
/// `S` itself does not need to be `Clone`.
pub struct AppState<S> {
    queries: Arc<OrderQueries<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            queries: Arc::clone(&self.queries),
        }
    }
}

impl<S: OrderStore> AppState<S> {
    /// Create a new application state.
    #[must_use]
    pub fn new(queries: OrderQueries<S>) -> Self {
        Self {
            queries: Arc::new(queries),
        }
    }

    /// The query facade.
    #[must_use]
    pub fn queries(&self) -> &OrderQueries<S> {
        &self.queries
    }
}
