//! Aggregate model for the order domain.
//!
//! These are the normalized entities as they live in the store. They stay
//! inside the query layer: strategies convert them into [`crate::view`]
//! shapes before anything reaches a caller.
//!
//! ```text
//! Member 1 ──── * Order 1 ──── 1 Delivery
//!                   │
//!                   1
//!                   │
//!                   * OrderItem * ──── 1 Item
//! ```
//!
//! `Member` deliberately carries no list of its orders. The back-reference
//! exists only as `Order::member_id`, so a loaded graph is always acyclic.

use crate::error::{QueryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "` from a raw key")]
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw key
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a member
    MemberId
);
entity_id!(
    /// Unique identifier for an order
    OrderId
);
entity_id!(
    /// Unique identifier for an order line
    OrderItemId
);
entity_id!(
    /// Unique identifier for a delivery
    DeliveryId
);
entity_id!(
    /// Unique identifier for a catalog item
    ItemId
);

/// Postal address, embedded by value in `Member` and `Delivery`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// City
    pub city: String,
    /// Street
    pub street: String,
    /// Postal code
    pub zipcode: String,
}

impl Address {
    /// Creates a new address
    #[must_use]
    pub fn new(
        city: impl Into<String>,
        street: impl Into<String>,
        zipcode: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            street: street.into(),
            zipcode: zipcode.into(),
        }
    }
}

/// Status of an order. Only ever moves `Placed` → `Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been placed
    Placed,
    /// Order was cancelled
    Cancelled,
}

impl OrderStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "PLACED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a status name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] for an unknown name.
    pub fn parse(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("placed") {
            Ok(Self::Placed)
        } else if s.eq_ignore_ascii_case("cancelled") {
            Ok(Self::Cancelled)
        } else {
            Err(QueryError::validation(format!("Invalid order status: {s}")))
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Waiting to ship
    Ready,
    /// Delivered; the order can no longer be cancelled
    Completed,
}

impl DeliveryStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parse a status name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] for an unknown name.
    pub fn parse(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("ready") {
            Ok(Self::Ready)
        } else if s.eq_ignore_ascii_case("completed") {
            Ok(Self::Completed)
        } else {
            Err(QueryError::validation(format!("Invalid delivery status: {s}")))
        }
    }
}

/// A registered member (buyer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Identity
    pub id: MemberId,
    /// Display name
    pub name: String,
    /// Home address, copied into each delivery at placement time
    pub address: Address,
}

/// A catalog item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Identity
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Current price in minor currency units
    pub price: i64,
    /// Units in stock
    pub stock_quantity: i32,
}

impl Item {
    /// Take `quantity` units out of stock.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] when stock would go negative.
    pub fn remove_stock(&mut self, quantity: i32) -> Result<()> {
        let remaining = self.stock_quantity - quantity;
        if remaining < 0 {
            return Err(QueryError::validation(format!(
                "Not enough stock for item {}: requested {quantity}, available {}",
                self.id, self.stock_quantity
            )));
        }
        self.stock_quantity = remaining;
        Ok(())
    }

    /// Put `quantity` units back into stock.
    pub const fn add_stock(&mut self, quantity: i32) {
        self.stock_quantity += quantity;
    }
}

/// Shipping record for exactly one order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// Identity
    pub id: DeliveryId,
    /// Destination, copied from the member at placement time
    pub address: Address,
    /// Shipping status
    pub status: DeliveryStatus,
}

/// Order aggregate root.
///
/// Relations are held as identities. Loading the member, the delivery or
/// the order lines is always an explicit store call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    member_id: MemberId,
    delivery_id: DeliveryId,
    order_date: DateTime<Utc>,
    status: OrderStatus,
}

impl Order {
    /// Rebuild an order from stored columns.
    #[must_use]
    pub const fn new(
        id: OrderId,
        member_id: MemberId,
        delivery_id: DeliveryId,
        order_date: DateTime<Utc>,
        status: OrderStatus,
    ) -> Self {
        Self {
            id,
            member_id,
            delivery_id,
            order_date,
            status,
        }
    }

    /// A freshly placed order.
    #[must_use]
    pub const fn place(
        id: OrderId,
        member_id: MemberId,
        delivery_id: DeliveryId,
        order_date: DateTime<Utc>,
    ) -> Self {
        Self::new(id, member_id, delivery_id, order_date, OrderStatus::Placed)
    }

    /// Identity
    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Owning member
    #[must_use]
    pub const fn member_id(&self) -> MemberId {
        self.member_id
    }

    /// The order's delivery
    #[must_use]
    pub const fn delivery_id(&self) -> DeliveryId {
        self.delivery_id
    }

    /// When the order was placed
    #[must_use]
    pub const fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Cancel the order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] if the delivery is already
    /// completed or the order is already cancelled.
    pub fn cancel(&mut self, delivery: &Delivery) -> Result<()> {
        if delivery.status == DeliveryStatus::Completed {
            return Err(QueryError::validation(format!(
                "Order {} has already been delivered",
                self.id
            )));
        }
        if self.status == OrderStatus::Cancelled {
            return Err(QueryError::validation(format!(
                "Order {} is already cancelled",
                self.id
            )));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

/// One purchased line of an order.
///
/// Price and quantity are fixed at creation; the price is a snapshot of the
/// catalog price at that moment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderItem {
    id: OrderItemId,
    order_id: OrderId,
    item_id: ItemId,
    unit_price: i64,
    quantity: i32,
}

impl OrderItem {
    /// Rebuild an order line from stored columns.
    #[must_use]
    pub const fn new(
        id: OrderItemId,
        order_id: OrderId,
        item_id: ItemId,
        unit_price: i64,
        quantity: i32,
    ) -> Self {
        Self {
            id,
            order_id,
            item_id,
            unit_price,
            quantity,
        }
    }

    /// Create a line for `item`, capturing its current price.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] if `quantity` is not positive.
    pub fn snapshot(id: OrderItemId, order_id: OrderId, item: &Item, quantity: i32) -> Result<Self> {
        if quantity <= 0 {
            return Err(QueryError::validation(format!(
                "Quantity must be positive, got {quantity}"
            )));
        }
        Ok(Self::new(id, order_id, item.id, item.price, quantity))
    }

    /// Identity
    #[must_use]
    pub const fn id(&self) -> OrderItemId {
        self.id
    }

    /// Owning order
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Referenced catalog item
    #[must_use]
    pub const fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Unit price at order time
    #[must_use]
    pub const fn unit_price(&self) -> i64 {
        self.unit_price
    }

    /// Units ordered
    #[must_use]
    pub const fn quantity(&self) -> i32 {
        self.quantity
    }
}

/// Write-side request to place an order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderDraft {
    /// Buyer
    pub member_id: MemberId,
    /// `(item, quantity)` pairs in display order
    pub lines: Vec<(ItemId, i32)>,
}

impl OrderDraft {
    /// Start a draft for `member_id` with no lines.
    #[must_use]
    pub const fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            lines: Vec::new(),
        }
    }

    /// Append a line.
    #[must_use]
    pub fn with_line(mut self, item_id: ItemId, quantity: i32) -> Self {
        self.lines.push((item_id, quantity));
        self
    }

    /// Check the draft can become an order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] if there are no lines or a
    /// quantity is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(QueryError::validation("An order needs at least one item"));
        }
        if let Some((item_id, quantity)) = self.lines.iter().find(|(_, q)| *q <= 0) {
            return Err(QueryError::validation(format!(
                "Quantity for item {item_id} must be positive, got {quantity}"
            )));
        }
        Ok(())
    }
}

/// An order line with its catalog item loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLine {
    /// The stored line
    pub order_item: OrderItem,
    /// The referenced catalog item
    pub item: Item,
}

/// A fully loaded order aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderGraph {
    /// Root
    pub order: Order,
    /// Buyer
    pub member: Member,
    /// Delivery
    pub delivery: Delivery,
    /// Lines in insertion order
    pub lines: Vec<OrderLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(price: i64, stock: i32) -> Item {
        Item {
            id: ItemId::new(1),
            name: "JPA1 BOOK".to_string(),
            price,
            stock_quantity: stock,
        }
    }

    fn delivery(status: DeliveryStatus) -> Delivery {
        Delivery {
            id: DeliveryId::new(1),
            address: Address::new("Seoul", "1", "1111"),
            status,
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(OrderStatus::parse("PLACED").ok(), Some(OrderStatus::Placed));
        assert_eq!(OrderStatus::parse("cancelled").ok(), Some(OrderStatus::Cancelled));
        assert!(matches!(
            OrderStatus::parse("SHIPPED"),
            Err(QueryError::ValidationFailed(_))
        ));
        assert_eq!(DeliveryStatus::parse("Completed").ok(), Some(DeliveryStatus::Completed));
    }

    #[test]
    fn test_snapshot_captures_price() {
        let mut item = book(10_000, 100);
        let line = OrderItem::snapshot(OrderItemId::new(1), OrderId::new(1), &item, 2);
        assert!(line.is_ok());
        item.price = 99_000;

        if let Ok(line) = line {
            assert_eq!(line.unit_price(), 10_000);
            assert_eq!(line.quantity(), 2);
        }
    }

    #[test]
    fn test_snapshot_rejects_non_positive_quantity() {
        let item = book(10_000, 100);
        let result = OrderItem::snapshot(OrderItemId::new(1), OrderId::new(1), &item, 0);
        assert!(matches!(result, Err(QueryError::ValidationFailed(_))));
    }

    #[test]
    fn test_stock() {
        let mut item = book(10_000, 3);
        assert!(item.remove_stock(2).is_ok());
        assert_eq!(item.stock_quantity, 1);
        assert!(item.remove_stock(2).is_err());
        assert_eq!(item.stock_quantity, 1);
        item.add_stock(2);
        assert_eq!(item.stock_quantity, 3);
    }

    #[test]
    fn test_cancel_transitions() {
        let mut order = Order::place(
            OrderId::new(1),
            MemberId::new(1),
            DeliveryId::new(1),
            Utc::now(),
        );
        assert!(order.cancel(&delivery(DeliveryStatus::Ready)).is_ok());
        assert_eq!(order.status(), OrderStatus::Cancelled);

        // never back, never twice
        assert!(order.cancel(&delivery(DeliveryStatus::Ready)).is_err());
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_after_delivery_fails() {
        let mut order = Order::place(
            OrderId::new(1),
            MemberId::new(1),
            DeliveryId::new(1),
            Utc::now(),
        );
        assert!(order.cancel(&delivery(DeliveryStatus::Completed)).is_err());
        assert_eq!(order.status(), OrderStatus::Placed);
    }

    #[test]
    fn test_draft_validation() {
        let empty = OrderDraft::new(MemberId::new(1));
        assert!(empty.validate().is_err());

        let negative = OrderDraft::new(MemberId::new(1)).with_line(ItemId::new(1), -1);
        assert!(negative.validate().is_err());

        let ok = OrderDraft::new(MemberId::new(1))
            .with_line(ItemId::new(1), 1)
            .with_line(ItemId::new(2), 3);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_id_display() {
        let id = OrderId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(id.get(), 7);
    }
}
