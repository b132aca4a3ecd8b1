//! Row decoding.
//!
//! Every query selects each column name at most once, so one decoder per
//! entity works for plain lookups and for joins alike. Joined columns that
//! would clash are aliased with their table name (`member_city`,
//! `delivery_status`, `item_name`, ...).

use order_query_core::{
    Address, Delivery, DeliveryId, DeliveryStatus, FlatOrderRow, Item, ItemId, Member, MemberId,
    Order, OrderId, OrderItem, OrderItemId, OrderLineRow, OrderStatus, OrderSummaryView,
    QueryError, Result,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

/// Map a driver error to the store failure callers see.
#[allow(clippy::needless_pass_by_value)] // Used as `map_err(db_error)`
pub(crate) fn db_error(error: sqlx::Error) -> QueryError {
    QueryError::StoreUnavailable(error.to_string())
}

fn address(row: &PgRow, prefix: &str) -> Address {
    Address::new(
        row.get::<String, _>(format!("{prefix}_city").as_str()),
        row.get::<String, _>(format!("{prefix}_street").as_str()),
        row.get::<String, _>(format!("{prefix}_zipcode").as_str()),
    )
}

/// `order_id, member_id, delivery_id, order_date, status`
pub(crate) fn order(row: &PgRow) -> Result<Order> {
    let status: String = row.get("status");
    Ok(Order::new(
        OrderId::new(row.get("order_id")),
        MemberId::new(row.get("member_id")),
        DeliveryId::new(row.get("delivery_id")),
        row.get("order_date"),
        OrderStatus::parse(&status)?,
    ))
}

/// `member_id, member_name, member_city, member_street, member_zipcode`
pub(crate) fn member(row: &PgRow) -> Member {
    Member {
        id: MemberId::new(row.get("member_id")),
        name: row.get("member_name"),
        address: address(row, "member"),
    }
}

/// `delivery_id, delivery_city, delivery_street, delivery_zipcode, delivery_status`
pub(crate) fn delivery(row: &PgRow) -> Result<Delivery> {
    let status: String = row.get("delivery_status");
    Ok(Delivery {
        id: DeliveryId::new(row.get("delivery_id")),
        address: address(row, "delivery"),
        status: DeliveryStatus::parse(&status)?,
    })
}

/// `order_item_id, order_id, item_id, order_price, count`
pub(crate) fn order_item(row: &PgRow) -> OrderItem {
    OrderItem::new(
        OrderItemId::new(row.get("order_item_id")),
        OrderId::new(row.get("order_id")),
        ItemId::new(row.get("item_id")),
        row.get("order_price"),
        row.get("count"),
    )
}

/// `item_id, item_name, price, stock_quantity`
pub(crate) fn item(row: &PgRow) -> Item {
    Item {
        id: ItemId::new(row.get("item_id")),
        name: row.get("item_name"),
        price: row.get("price"),
        stock_quantity: row.get("stock_quantity"),
    }
}

/// `order_id, buyer_name, order_date, status, delivery_city, delivery_street, delivery_zipcode`
pub(crate) fn summary(row: &PgRow) -> Result<OrderSummaryView> {
    let status: String = row.get("status");
    Ok(OrderSummaryView {
        id: OrderId::new(row.get("order_id")),
        buyer_name: row.get("buyer_name"),
        order_date: row.get("order_date"),
        status: OrderStatus::parse(&status)?,
        address: address(row, "delivery"),
    })
}

/// `order_id, item_name, order_price, count`
pub(crate) fn line(row: &PgRow) -> OrderLineRow {
    OrderLineRow {
        order_id: OrderId::new(row.get("order_id")),
        item_name: row.get("item_name"),
        unit_price: row.get("order_price"),
        quantity: row.get("count"),
    }
}

/// Summary columns plus `item_name, order_price, count`
pub(crate) fn flat(row: &PgRow) -> Result<FlatOrderRow> {
    let header = summary(row)?;
    Ok(FlatOrderRow {
        order_id: header.id,
        buyer_name: header.buyer_name,
        order_date: header.order_date,
        status: header.status,
        address: header.address,
        item_name: row.get("item_name"),
        unit_price: row.get("order_price"),
        quantity: row.get("count"),
    })
}
