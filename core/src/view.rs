//! Read-side shapes returned to callers.
//!
//! Views are plain owned data with no back-references, safe to serialize
//! as-is.

use crate::model::{Address, OrderGraph, OrderId, OrderStatus};
use crate::store::OrderLineRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One purchased line as seen by a caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLineView {
    /// Catalog item name
    pub item_name: String,
    /// Unit price at order time
    pub unit_price: i64,
    /// Units ordered
    pub quantity: i32,
}

impl From<OrderLineRow> for OrderLineView {
    fn from(row: OrderLineRow) -> Self {
        Self {
            item_name: row.item_name,
            unit_price: row.unit_price,
            quantity: row.quantity,
        }
    }
}

/// An order with its to-one fields only (no line items).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSummaryView {
    /// Order identity
    pub id: OrderId,
    /// Buyer display name
    pub buyer_name: String,
    /// When the order was placed
    pub order_date: DateTime<Utc>,
    /// Current status
    pub status: OrderStatus,
    /// Delivery address
    pub address: Address,
}

impl OrderSummaryView {
    /// Attach line items, producing the full view.
    #[must_use]
    pub fn with_items(self, items: Vec<OrderLineView>) -> OrderView {
        OrderView {
            id: self.id,
            buyer_name: self.buyer_name,
            order_date: self.order_date,
            status: self.status,
            address: self.address,
            items,
        }
    }
}

/// The API-ready order aggregate every fetch strategy produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    /// Order identity
    pub id: OrderId,
    /// Buyer display name
    pub buyer_name: String,
    /// When the order was placed
    pub order_date: DateTime<Utc>,
    /// Current status
    pub status: OrderStatus,
    /// Delivery address
    pub address: Address,
    /// Line items in insertion order
    pub items: Vec<OrderLineView>,
}

impl From<&OrderGraph> for OrderView {
    fn from(graph: &OrderGraph) -> Self {
        Self {
            id: graph.order.id(),
            buyer_name: graph.member.name.clone(),
            order_date: graph.order.order_date(),
            status: graph.order.status(),
            address: graph.delivery.address.clone(),
            items: graph
                .lines
                .iter()
                .map(|line| OrderLineView {
                    item_name: line.item.name.clone(),
                    unit_price: line.order_item.unit_price(),
                    quantity: line.order_item.quantity(),
                })
                .collect(),
        }
    }
}

impl From<OrderGraph> for OrderView {
    fn from(graph: OrderGraph) -> Self {
        Self::from(&graph)
    }
}
