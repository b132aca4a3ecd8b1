//! Round-trip accounting for read sessions.
//!
//! [`RoundTripMeter`] wraps any [`OrderReader`] and counts, logs and exports
//! every call before delegating. The facade wraps each session in one, so
//! stores do not need their own instrumentation.
//!
//! # Metrics
//!
//! - `order_query.round_trips` (counter, label `query`)

use crate::criteria::{OrderCriteria, Pagination};
use crate::error::Result;
use crate::model::{Delivery, DeliveryId, Item, ItemId, Member, MemberId, Order, OrderId, OrderItem};
use crate::store::{FlatOrderRow, OrderGraphRow, OrderLineRow, OrderReader, OrderRoot, QueryKind};
use crate::view::OrderSummaryView;

/// An [`OrderReader`] decorator that counts round trips.
#[derive(Debug)]
pub struct RoundTripMeter<R> {
    inner: R,
    round_trips: usize,
}

impl<R: OrderReader> RoundTripMeter<R> {
    /// Wrap a session.
    #[must_use]
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            round_trips: 0,
        }
    }

    /// Round trips issued so far.
    #[must_use]
    pub const fn round_trips(&self) -> usize {
        self.round_trips
    }

    fn record(&mut self, kind: QueryKind) {
        self.round_trips += 1;
        metrics::counter!("order_query.round_trips", "query" => kind.as_str()).increment(1);
        tracing::debug!(query = kind.as_str(), round_trip = self.round_trips, "Store round trip");
    }
}

impl<R: OrderReader> OrderReader for RoundTripMeter<R> {
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        self.record(QueryKind::OrderById);
        self.inner.find_order(id).await
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>> {
        self.record(QueryKind::MemberById);
        self.inner.find_member(id).await
    }

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Option<Delivery>> {
        self.record(QueryKind::DeliveryById);
        self.inner.find_delivery(id).await
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        self.record(QueryKind::ItemById);
        self.inner.find_item(id).await
    }

    async fn find_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        self.record(QueryKind::OrderItemsByOrder);
        self.inner.find_order_items(order_id).await
    }

    async fn search_orders(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<Order>> {
        self.record(QueryKind::Orders);
        self.inner.search_orders(criteria, window).await
    }

    async fn search_order_roots(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<OrderRoot>> {
        self.record(QueryKind::OrderRoots);
        self.inner.search_order_roots(criteria, window).await
    }

    async fn search_order_graph(&mut self, criteria: &OrderCriteria) -> Result<Vec<OrderGraphRow>> {
        self.record(QueryKind::OrderGraphRows);
        self.inner.search_order_graph(criteria).await
    }

    async fn order_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderItem>> {
        self.record(QueryKind::OrderItemsBatch);
        self.inner.order_items_in(order_ids).await
    }

    async fn items_in(&mut self, item_ids: &[ItemId]) -> Result<Vec<Item>> {
        self.record(QueryKind::ItemsBatch);
        self.inner.items_in(item_ids).await
    }

    async fn project_order_headers(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<OrderSummaryView>> {
        self.record(QueryKind::OrderHeaders);
        self.inner.project_order_headers(criteria, window).await
    }

    async fn project_order_lines(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderLineRow>> {
        self.record(QueryKind::OrderLines);
        self.inner.project_order_lines(order_ids).await
    }

    async fn project_flat_rows(&mut self, criteria: &OrderCriteria) -> Result<Vec<FlatOrderRow>> {
        self.record(QueryKind::FlatOrderRows);
        self.inner.project_flat_rows(criteria).await
    }

    async fn finish(self) -> Result<()> {
        self.inner.finish().await
    }
}
