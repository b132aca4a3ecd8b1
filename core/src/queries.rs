//! Query facade.
//!
//! [`OrderQueries`] is the one entry point callers use. Per request it
//!
//! 1. rejects requests that cannot be served (before touching the store),
//! 2. opens one read session, wrapped in a [`RoundTripMeter`],
//! 3. runs the selected strategy to completion,
//! 4. closes the session and records metrics.
//!
//! Any error along the way drops the session and is returned as-is.
//!
//! # Metrics
//!
//! - `order_query.requests` (counter, label `strategy`)
//! - `order_query.failures` (counter, label `strategy`)
//! - `order_query.round_trips_per_request` (histogram, label `strategy`)

use crate::config::QueryConfig;
use crate::criteria::{OrderCriteria, Pagination};
use crate::error::{QueryError, Result};
use crate::loader::BatchLoader;
use crate::meter::RoundTripMeter;
use crate::model::OrderId;
use crate::store::{OrderReader, OrderRoot, OrderStore};
use crate::strategy::{self, FetchPlan, FetchStrategy};
use crate::view::{OrderSummaryView, OrderView};

// Metric labels for the reads that do not go through a strategy.
const FIND_ORDER: &str = "find-order";
const SUMMARIES: &str = "order-summaries";

/// Read facade over an [`OrderStore`].
///
/// Cheap to share behind an `Arc`; holds no per-request state.
#[derive(Debug)]
pub struct OrderQueries<S> {
    store: S,
    config: QueryConfig,
}

impl<S: OrderStore> OrderQueries<S> {
    /// Create a facade.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] if `config` is invalid.
    pub fn new(store: S, config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// List the orders matching `criteria` using `strategy`.
    ///
    /// Without `pagination`, paginable strategies return at most
    /// `max_rows` orders; the full-graph joins return every match.
    ///
    /// # Errors
    ///
    /// - [`QueryError::UnsupportedPagination`] when `pagination` is given for
    ///   a strategy that cannot window its root query. No session is opened.
    /// - [`QueryError::ValidationFailed`] when the window exceeds
    ///   `max_page_limit`. No session is opened.
    /// - [`QueryError::StoreUnavailable`] on any store failure.
    /// - [`QueryError::NotFound`] if a referenced relation is missing.
    pub async fn list_orders(
        &self,
        criteria: &OrderCriteria,
        strategy: FetchStrategy,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderView>> {
        if pagination.is_some() && !strategy.supports_pagination() {
            tracing::warn!(
                strategy = strategy.as_str(),
                "Rejected paginated request for non-paginable strategy"
            );
            return Err(QueryError::UnsupportedPagination { strategy });
        }
        let window = self.window(pagination)?;

        let plan = FetchPlan {
            criteria,
            window,
            loader: BatchLoader::new(self.config.batch_size),
        };

        let result = async {
            let mut reader = RoundTripMeter::new(self.store.begin_read().await?);
            let views = strategy::execute(strategy, &mut reader, &plan).await?;
            let round_trips = reader.round_trips();
            reader.finish().await?;
            Ok::<_, QueryError>((views, round_trips))
        }
        .await;

        let (views, round_trips) = observe(strategy.as_str(), result)?;
        tracing::info!(
            strategy = strategy.as_str(),
            orders = views.len(),
            round_trips,
            paginated = pagination.is_some(),
            "Listed orders"
        );
        Ok(views)
    }

    /// Load one order by id.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] if no order has this id.
    /// - [`QueryError::StoreUnavailable`] on any store failure.
    pub async fn find_order(&self, id: OrderId) -> Result<OrderView> {
        let loader = BatchLoader::new(self.config.batch_size);

        let result = async {
            let mut reader = RoundTripMeter::new(self.store.begin_read().await?);

            let order = reader
                .find_order(id)
                .await?
                .ok_or_else(|| QueryError::not_found("order", id.get()))?;
            let member = reader
                .find_member(order.member_id())
                .await?
                .ok_or_else(|| QueryError::not_found("member", order.member_id().get()))?;
            let delivery = reader
                .find_delivery(order.delivery_id())
                .await?
                .ok_or_else(|| QueryError::not_found("delivery", order.delivery_id().get()))?;

            let root = OrderRoot {
                order,
                member,
                delivery,
            };
            let graph = strategy::assemble_graphs(&mut reader, loader, vec![root])
                .await?
                .pop()
                .ok_or_else(|| QueryError::not_found("order", id.get()))?;

            let round_trips = reader.round_trips();
            reader.finish().await?;
            Ok::<_, QueryError>((OrderView::from(graph), round_trips))
        }
        .await;

        let (view, round_trips) = observe(FIND_ORDER, result)?;
        tracing::info!(order_id = id.get(), round_trips, "Loaded order");
        Ok(view)
    }

    /// List orders without their lines, one round trip.
    ///
    /// # Errors
    ///
    /// - [`QueryError::ValidationFailed`] when the window exceeds
    ///   `max_page_limit`.
    /// - [`QueryError::StoreUnavailable`] on any store failure.
    pub async fn list_order_summaries(
        &self,
        criteria: &OrderCriteria,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderSummaryView>> {
        let window = self.window(pagination)?;

        let result = async {
            let mut reader = RoundTripMeter::new(self.store.begin_read().await?);
            let summaries = reader.project_order_headers(criteria, window).await?;
            let round_trips = reader.round_trips();
            reader.finish().await?;
            Ok::<_, QueryError>((summaries, round_trips))
        }
        .await;

        let (summaries, round_trips) = observe(SUMMARIES, result)?;
        tracing::info!(orders = summaries.len(), round_trips, "Listed order summaries");
        Ok(summaries)
    }

    fn window(&self, pagination: Option<Pagination>) -> Result<Pagination> {
        match pagination {
            Some(page) => {
                self.config.check_page(page)?;
                Ok(page)
            }
            None => Ok(Pagination::first(self.config.max_rows)),
        }
    }
}

/// Record request metrics and pass the result through.
fn observe<T>(label: &'static str, result: Result<(T, usize)>) -> Result<(T, usize)> {
    metrics::counter!("order_query.requests", "strategy" => label).increment(1);
    match result {
        Ok((value, round_trips)) => {
            let round_trips_f64 = f64::from(u32::try_from(round_trips).unwrap_or(u32::MAX));
            metrics::histogram!("order_query.round_trips_per_request", "strategy" => label)
                .record(round_trips_f64);
            Ok((value, round_trips))
        }
        Err(error) => {
            metrics::counter!("order_query.failures", "strategy" => label).increment(1);
            tracing::warn!(strategy = label, error = %error, "Order query failed");
            Err(error)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Delivery, DeliveryId, Item, ItemId, Member, MemberId, Order, OrderItem};
    use crate::store::{FlatOrderRow, OrderGraphRow, OrderLineRow};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A store with no data that counts sessions.
    #[derive(Default)]
    struct EmptyStore {
        sessions: Arc<AtomicUsize>,
    }

    struct EmptyReader;

    impl OrderStore for EmptyStore {
        type Reader = EmptyReader;

        async fn begin_read(&self) -> Result<EmptyReader> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(EmptyReader)
        }
    }

    impl OrderReader for EmptyReader {
        async fn find_order(&mut self, _id: OrderId) -> Result<Option<Order>> {
            Ok(None)
        }
        async fn find_member(&mut self, _id: MemberId) -> Result<Option<Member>> {
            Ok(None)
        }
        async fn find_delivery(&mut self, _id: DeliveryId) -> Result<Option<Delivery>> {
            Ok(None)
        }
        async fn find_item(&mut self, _id: ItemId) -> Result<Option<Item>> {
            Ok(None)
        }
        async fn find_order_items(&mut self, _order_id: OrderId) -> Result<Vec<OrderItem>> {
            Ok(Vec::new())
        }
        async fn search_orders(&mut self, _: &OrderCriteria, _: Pagination) -> Result<Vec<Order>> {
            Ok(Vec::new())
        }
        async fn search_order_roots(
            &mut self,
            _: &OrderCriteria,
            _: Pagination,
        ) -> Result<Vec<OrderRoot>> {
            Ok(Vec::new())
        }
        async fn search_order_graph(&mut self, _: &OrderCriteria) -> Result<Vec<OrderGraphRow>> {
            Ok(Vec::new())
        }
        async fn order_items_in(&mut self, _: &[OrderId]) -> Result<Vec<OrderItem>> {
            Ok(Vec::new())
        }
        async fn items_in(&mut self, _: &[ItemId]) -> Result<Vec<Item>> {
            Ok(Vec::new())
        }
        async fn project_order_headers(
            &mut self,
            _: &OrderCriteria,
            _: Pagination,
        ) -> Result<Vec<OrderSummaryView>> {
            Ok(Vec::new())
        }
        async fn project_order_lines(&mut self, _: &[OrderId]) -> Result<Vec<OrderLineRow>> {
            Ok(Vec::new())
        }
        async fn project_flat_rows(&mut self, _: &OrderCriteria) -> Result<Vec<FlatOrderRow>> {
            Ok(Vec::new())
        }
        async fn finish(self) -> Result<()> {
            Ok(())
        }
    }

    fn queries() -> (OrderQueries<EmptyStore>, Arc<AtomicUsize>) {
        let store = EmptyStore::default();
        let sessions = Arc::clone(&store.sessions);
        (OrderQueries::new(store, QueryConfig::default()).unwrap(), sessions)
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = OrderQueries::new(EmptyStore::default(), QueryConfig::new().with_batch_size(0));
        assert!(matches!(result, Err(QueryError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_paginated_flat_projection_fails_without_a_session() {
        let (queries, sessions) = queries();

        for strategy in [FetchStrategy::ProjectionFlat, FetchStrategy::FetchJoinGraph] {
            let result = queries
                .list_orders(&OrderCriteria::any(), strategy, Some(Pagination::first(10)))
                .await;
            assert!(matches!(
                result,
                Err(QueryError::UnsupportedPagination { strategy: s }) if s == strategy
            ));
        }

        assert_eq!(sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_limit_fails_without_a_session() {
        let (queries, sessions) = queries();
        let page = Pagination::new(0, 5000).unwrap();

        let result = queries
            .list_orders(&OrderCriteria::any(), FetchStrategy::default(), Some(page))
            .await;

        assert!(matches!(result, Err(QueryError::ValidationFailed(_))));
        assert_eq!(sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_strategy_handles_an_empty_store() {
        let (queries, sessions) = queries();

        for strategy in FetchStrategy::ALL {
            let views = queries
                .list_orders(&OrderCriteria::any(), strategy, None)
                .await
                .unwrap();
            assert!(views.is_empty(), "{strategy} returned orders");
        }

        assert_eq!(sessions.load(Ordering::SeqCst), FetchStrategy::ALL.len());
    }

    #[tokio::test]
    async fn test_find_missing_order() {
        let (queries, _) = queries();
        let result = queries.find_order(OrderId::new(404)).await;
        assert!(matches!(
            result,
            Err(QueryError::NotFound { entity: "order", id: 404 })
        ));
    }
}
