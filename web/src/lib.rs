//! Axum HTTP surface for the order query layer.
//!
//! The handlers only parse requests and render responses. Strategy
//! selection, validation and session handling stay in
//! [`order_query_core::OrderQueries`].
//!
//! # Routes
//!
//! ```text
//! GET /health                                              liveness
//! GET /api/orders?strategy=&status=&buyer=&offset=&limit=  [OrderView]
//! GET /api/orders/:id                                      OrderView
//! GET /api/simple-orders?status=&buyer=&offset=&limit=     [OrderSummaryView]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use order_query_core::{OrderQueries, QueryConfig};
//! use order_query_web::{AppState, router};
//!
//! let queries = OrderQueries::new(store, QueryConfig::default())?;
//! let app = router(AppState::new(queries));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::{Router, routing::get};
use order_query_core::OrderStore;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// Build the router for every order endpoint.
pub fn router<S: OrderStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/orders", get(handlers::list_orders::<S>))
        .route("/api/orders/:id", get(handlers::get_order::<S>))
        .route("/api/simple-orders", get(handlers::list_simple_orders::<S>))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
