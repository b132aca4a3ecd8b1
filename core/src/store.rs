//! Contract the fetch strategies require from the persistence substrate.
//!
//! # Design
//!
//! The contract is split in two:
//!
//! - [`OrderStore`] is long-lived and shared. Its only job is to open a
//!   read session.
//! - [`OrderReader`] is one read session (a read-only transaction on a real
//!   database, a snapshot in memory). **Every method is exactly one round
//!   trip.** Strategies are therefore measured by counting calls.
//!
//! Nothing on the reader loads lazily. A relation is only fetched when a
//! strategy calls the method for it.
//!
//! # Implementations
//!
//! - `PgOrderStore` (in `order-query-postgres`): production implementation
//! - `InMemoryOrderStore` (in `order-query-testing`): snapshot-based, records
//!   every round trip for assertions
//!
//! # Ordering
//!
//! Root queries return orders ascending by order id. Line queries return
//! lines ascending by order-item id. Offset/limit windows apply to root rows
//! in that order.

use crate::criteria::{OrderCriteria, Pagination};
use crate::error::Result;
use crate::model::{
    Address, Delivery, DeliveryId, Item, ItemId, Member, MemberId, Order, OrderId, OrderItem,
    OrderStatus,
};
use crate::view::OrderSummaryView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// The round-trip kinds a reader can issue.
///
/// Used as a metrics label and by test stores to record traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Order by id
    OrderById,
    /// Member by id
    MemberById,
    /// Delivery by id
    DeliveryById,
    /// Catalog item by id
    ItemById,
    /// Lines of one order
    OrderItemsByOrder,
    /// Orders joined with members, filtered and windowed
    Orders,
    /// Orders joined with member and delivery, filtered and windowed
    OrderRoots,
    /// Whole graph joined, one row per line
    OrderGraphRows,
    /// Lines for an IN-list of orders
    OrderItemsBatch,
    /// Catalog items for an IN-list of ids
    ItemsBatch,
    /// Projected to-one fields, filtered and windowed
    OrderHeaders,
    /// Projected lines for an IN-list of orders
    OrderLines,
    /// Projected flat rows, one per line
    FlatOrderRows,
}

impl QueryKind {
    /// Stable label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OrderById => "order_by_id",
            Self::MemberById => "member_by_id",
            Self::DeliveryById => "delivery_by_id",
            Self::ItemById => "item_by_id",
            Self::OrderItemsByOrder => "order_items_by_order",
            Self::Orders => "orders",
            Self::OrderRoots => "order_roots",
            Self::OrderGraphRows => "order_graph_rows",
            Self::OrderItemsBatch => "order_items_batch",
            Self::ItemsBatch => "items_batch",
            Self::OrderHeaders => "order_headers",
            Self::OrderLines => "order_lines",
            Self::FlatOrderRows => "flat_order_rows",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order with both to-one relations fetched in the same row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRoot {
    /// Root
    pub order: Order,
    /// Buyer
    pub member: Member,
    /// Delivery
    pub delivery: Delivery,
}

/// One row of the full-graph fetch join. Repeats the order columns once per
/// line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderGraphRow {
    /// Root (duplicated across the order's rows)
    pub order: Order,
    /// Buyer (duplicated)
    pub member: Member,
    /// Delivery (duplicated)
    pub delivery: Delivery,
    /// The line this row is for
    pub order_item: OrderItem,
    /// The line's catalog item
    pub item: Item,
}

/// Projected line fields plus the owning order id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLineRow {
    /// Owning order
    pub order_id: OrderId,
    /// Catalog item name
    pub item_name: String,
    /// Unit price at order time
    pub unit_price: i64,
    /// Units ordered
    pub quantity: i32,
}

/// One row of the flat projection: order-level columns repeated per line.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlatOrderRow {
    /// Order identity
    pub order_id: OrderId,
    /// Buyer display name
    pub buyer_name: String,
    /// When the order was placed
    pub order_date: DateTime<Utc>,
    /// Order status
    pub status: OrderStatus,
    /// Delivery address
    pub address: Address,
    /// Catalog item name
    pub item_name: String,
    /// Unit price at order time
    pub unit_price: i64,
    /// Units ordered
    pub quantity: i32,
}

/// Entry point to the persistence substrate.
///
/// # Thread Safety
///
/// Shared across requests, so it must be `Send + Sync`. Sessions are not
/// shared.
pub trait OrderStore: Send + Sync {
    /// Session type produced by [`OrderStore::begin_read`].
    type Reader: OrderReader;

    /// Open a read-only session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QueryError::StoreUnavailable`] if no session can be
    /// opened.
    fn begin_read(&self) -> impl Future<Output = Result<Self::Reader>> + Send;
}

/// One read-only session. Every method is one round trip.
///
/// Dropping a reader without calling [`OrderReader::finish`] abandons the
/// session (rollback on a real database).
///
/// # Errors
///
/// Every method returns [`crate::QueryError::StoreUnavailable`] when the
/// substrate fails.
pub trait OrderReader: Send {
    /// Order by id.
    fn find_order(&mut self, id: OrderId) -> impl Future<Output = Result<Option<Order>>> + Send;

    /// Member by id.
    fn find_member(&mut self, id: MemberId) -> impl Future<Output = Result<Option<Member>>> + Send;

    /// Delivery by id.
    fn find_delivery(
        &mut self,
        id: DeliveryId,
    ) -> impl Future<Output = Result<Option<Delivery>>> + Send;

    /// Catalog item by id.
    fn find_item(&mut self, id: ItemId) -> impl Future<Output = Result<Option<Item>>> + Send;

    /// Lines of one order.
    fn find_order_items(
        &mut self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Vec<OrderItem>>> + Send;

    /// Orders joined with their member for filtering, windowed.
    ///
    /// Only order columns are returned; relations stay unloaded.
    fn search_orders(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// Orders fetch-joined with member and delivery, windowed.
    ///
    /// To-one joins never multiply rows, so the window is exact.
    fn search_order_roots(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> impl Future<Output = Result<Vec<OrderRoot>>> + Send;

    /// The whole graph fetch-joined, one row per line. Cannot be windowed.
    fn search_order_graph(
        &mut self,
        criteria: &OrderCriteria,
    ) -> impl Future<Output = Result<Vec<OrderGraphRow>>> + Send;

    /// Lines of every order in `order_ids` (IN-list).
    fn order_items_in(
        &mut self,
        order_ids: &[OrderId],
    ) -> impl Future<Output = Result<Vec<OrderItem>>> + Send;

    /// Catalog items in `item_ids` (IN-list).
    fn items_in(&mut self, item_ids: &[ItemId]) -> impl Future<Output = Result<Vec<Item>>> + Send;

    /// Projected to-one fields, windowed.
    fn project_order_headers(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> impl Future<Output = Result<Vec<OrderSummaryView>>> + Send;

    /// Projected lines of every order in `order_ids` (IN-list).
    fn project_order_lines(
        &mut self,
        order_ids: &[OrderId],
    ) -> impl Future<Output = Result<Vec<OrderLineRow>>> + Send;

    /// Projected flat rows, one per line. Cannot be windowed.
    fn project_flat_rows(
        &mut self,
        criteria: &OrderCriteria,
    ) -> impl Future<Output = Result<Vec<FlatOrderRow>>> + Send;

    /// Close the session.
    fn finish(self) -> impl Future<Output = Result<()>> + Send;
}
