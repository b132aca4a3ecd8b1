//! # Order Query Testing
//!
//! Testing utilities for the order query layer.
//!
//! This crate provides:
//! - [`InMemoryOrderStore`]: an [`OrderStore`](order_query_core::OrderStore)
//!   that records every round trip and can simulate outages
//! - Fixtures with the sample shops used across the test suites
//! - Property-based testing strategies for datasets and criteria
//!
//! ## Example
//!
//! ```ignore
//! use order_query_testing::{InMemoryOrderStore, fixtures};
//! use order_query_core::{FetchStrategy, OrderCriteria, OrderQueries, QueryConfig, QueryKind};
//!
//! #[tokio::test]
//! async fn test_batched_fetch_join() {
//!     let store = InMemoryOrderStore::new();
//!     fixtures::spring_summer(&store);
//!     let queries = OrderQueries::new(store.clone(), QueryConfig::default()).unwrap();
//!
//!     let orders = queries
//!         .list_orders(&OrderCriteria::any(), FetchStrategy::FetchJoinBatched, None)
//!         .await
//!         .unwrap();
//!
//!     assert_eq!(orders.len(), 2);
//!     assert_eq!(store.count(QueryKind::OrderItemsBatch), 1);
//! }
//! ```

pub mod fixtures;
pub mod memory;
pub mod properties;

// Re-export commonly used items
pub use fixtures::test_time;
pub use memory::{InMemoryOrderReader, InMemoryOrderStore, Outage};
pub use properties::{DatasetSpec, arb_criteria, arb_dataset};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_is_fixed() {
        assert_eq!(test_time(), test_time());
    }

    #[test]
    fn test_bookshop_fixture() {
        let store = InMemoryOrderStore::new();
        let orders = fixtures::bookshop(&store);
        assert_eq!(orders.len(), 2);
        assert_eq!(store.order_item_count(), 4);
    }
}
