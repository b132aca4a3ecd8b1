//! # Order Query Core
//!
//! Aggregate model, store contract and fetch strategies for serving
//! `Order` read models out of a normalized relational store.
//!
//! ## Core Concepts
//!
//! - **Aggregate model**: `Member`, `Order`, `OrderItem`, `Delivery`, `Item`
//!   and the `Address` value object. Internal only, never handed to callers.
//! - **Views**: `OrderView` and `OrderSummaryView`, the acyclic read shapes
//!   every strategy emits.
//! - **Store contract**: [`OrderStore`] opens a read session, [`OrderReader`]
//!   exposes one method per round trip.
//! - **Fetch strategies**: [`FetchStrategy`] selects one of several
//!   algorithms with the same logical result and different round-trip and
//!   pagination characteristics.
//! - **Facade**: [`OrderQueries`] validates the request, picks the strategy
//!   and runs it inside one read session.
//!
//! ## Round Trips
//!
//! ```text
//! strategy              round trips                         paginates
//! entity-graph          1 + 3N + items                      yes
//! entity-to-view        1 + 3N + items                      yes
//! fetch-join-graph      1                                   no
//! fetch-join-batched    1 + ceil(N/B) + ceil(distinct/B)    yes
//! projection-per-order  1 + N                               yes
//! projection-batched    2                                   yes
//! projection-flat       1                                   no
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use order_query_core::{FetchStrategy, OrderCriteria, OrderQueries, Pagination, QueryConfig};
//!
//! let queries = OrderQueries::new(store, QueryConfig::default())?;
//! let criteria = OrderCriteria::any().with_buyer_name("spring");
//! let page = Pagination::new(0, 20)?;
//!
//! let orders = queries
//!     .list_orders(&criteria, FetchStrategy::FetchJoinBatched, Some(page))
//!     .await?;
//! ```

pub mod assembler;
pub mod config;
pub mod criteria;
pub mod error;
pub mod loader;
pub mod meter;
pub mod model;
pub mod queries;
pub mod store;
pub mod strategy;
pub mod view;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub use config::QueryConfig;
pub use criteria::{OrderCriteria, Pagination};
pub use error::{QueryError, Result};
pub use loader::BatchLoader;
pub use model::{
    Address, Delivery, DeliveryId, DeliveryStatus, Item, ItemId, Member, MemberId, Order,
    OrderDraft, OrderGraph, OrderId, OrderItem, OrderItemId, OrderLine, OrderStatus,
};
pub use queries::OrderQueries;
pub use store::{
    FlatOrderRow, OrderGraphRow, OrderLineRow, OrderReader, OrderRoot, OrderStore, QueryKind,
};
pub use strategy::FetchStrategy;
pub use view::{OrderLineView, OrderSummaryView, OrderView};
