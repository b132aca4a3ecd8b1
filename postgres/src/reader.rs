//! Read sessions over a `READ ONLY` transaction.

use crate::rows::{self, db_error};
use order_query_core::{
    Delivery, DeliveryId, FlatOrderRow, Item, ItemId, Member, MemberId, Order, OrderCriteria,
    OrderGraphRow, OrderId, OrderItem, OrderLineRow, OrderReader, OrderRoot, OrderSummaryView,
    Pagination, Result,
};
use sqlx::{Postgres, Transaction};

/// Optional filters, bound as `$1` (status) and `$2` (buyer-name `LIKE`
/// pattern). `NULL` disables a filter.
const FILTER: &str = r"($1::text IS NULL OR o.status = $1)
    AND ($2::text IS NULL OR m.name LIKE $2 ESCAPE '\')";

const ORDER_COLUMNS: &str = "o.order_id, o.member_id, o.delivery_id, o.order_date, o.status";

const MEMBER_COLUMNS: &str = "m.name AS member_name, m.city AS member_city, \
     m.street AS member_street, m.zipcode AS member_zipcode";

const DELIVERY_COLUMNS: &str = "d.city AS delivery_city, d.street AS delivery_street, \
     d.zipcode AS delivery_zipcode, d.status AS delivery_status";

const SUMMARY_COLUMNS: &str = "o.order_id, m.name AS buyer_name, o.order_date, o.status, \
     d.city AS delivery_city, d.street AS delivery_street, d.zipcode AS delivery_zipcode";

const ROOT_JOINS: &str = "FROM orders o \
     JOIN member m ON m.member_id = o.member_id \
     JOIN delivery d ON d.delivery_id = o.delivery_id";

const LINE_JOINS: &str = "JOIN order_item oi ON oi.order_id = o.order_id \
     JOIN item i ON i.item_id = oi.item_id";

fn window_bounds(window: Pagination) -> (i64, i64) {
    (
        i64::try_from(window.limit()).unwrap_or(i64::MAX),
        i64::try_from(window.offset()).unwrap_or(i64::MAX),
    )
}

fn raw_ids<I: Copy>(ids: &[I], get: impl Fn(I) -> i64) -> Vec<i64> {
    ids.iter().copied().map(get).collect()
}

/// One read session on a pooled connection.
///
/// Dropping it without [`OrderReader::finish`] rolls the transaction back.
#[derive(Debug)]
pub struct PgOrderReader {
    tx: Transaction<'static, Postgres>,
}

impl PgOrderReader {
    pub(crate) const fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

impl OrderReader for PgOrderReader {
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r"
            SELECT order_id, member_id, delivery_id, order_date, status
            FROM orders
            WHERE order_id = $1
            ",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?;

        row.as_ref().map(rows::order).transpose()
    }

    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query(
            r"
            SELECT member_id, name AS member_name, city AS member_city,
                   street AS member_street, zipcode AS member_zipcode
            FROM member
            WHERE member_id = $1
            ",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?;

        Ok(row.as_ref().map(rows::member))
    }

    async fn find_delivery(&mut self, id: DeliveryId) -> Result<Option<Delivery>> {
        let row = sqlx::query(
            r"
            SELECT delivery_id, city AS delivery_city, street AS delivery_street,
                   zipcode AS delivery_zipcode, status AS delivery_status
            FROM delivery
            WHERE delivery_id = $1
            ",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?;

        row.as_ref().map(rows::delivery).transpose()
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query(
            r"
            SELECT item_id, name AS item_name, price, stock_quantity
            FROM item
            WHERE item_id = $1
            ",
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?;

        Ok(row.as_ref().map(rows::item))
    }

    async fn find_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let found = sqlx::query(
            r"
            SELECT order_item_id, order_id, item_id, order_price, count
            FROM order_item
            WHERE order_id = $1
            ORDER BY order_item_id
            ",
        )
        .bind(order_id.get())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;

        Ok(found.iter().map(rows::order_item).collect())
    }

    async fn search_orders(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o \
             JOIN member m ON m.member_id = o.member_id \
             WHERE {FILTER} \
             ORDER BY o.order_id LIMIT $3 OFFSET $4"
        );
        let (limit, offset) = window_bounds(window);

        let found = sqlx::query(&sql)
            .bind(criteria.status().map(|status| status.as_str()))
            .bind(criteria.like_pattern())
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)?;

        found.iter().map(rows::order).collect()
    }

    async fn search_order_roots(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<OrderRoot>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}, {MEMBER_COLUMNS}, {DELIVERY_COLUMNS} \
             {ROOT_JOINS} \
             WHERE {FILTER} \
             ORDER BY o.order_id LIMIT $3 OFFSET $4"
        );
        let (limit, offset) = window_bounds(window);

        let found = sqlx::query(&sql)
            .bind(criteria.status().map(|status| status.as_str()))
            .bind(criteria.like_pattern())
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)?;

        found
            .iter()
            .map(|row| {
                Ok(OrderRoot {
                    order: rows::order(row)?,
                    member: rows::member(row),
                    delivery: rows::delivery(row)?,
                })
            })
            .collect()
    }

    async fn search_order_graph(&mut self, criteria: &OrderCriteria) -> Result<Vec<OrderGraphRow>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}, {MEMBER_COLUMNS}, {DELIVERY_COLUMNS}, \
                    oi.order_item_id, oi.item_id, oi.order_price, oi.count, \
                    i.name AS item_name, i.price, i.stock_quantity \
             {ROOT_JOINS} {LINE_JOINS} \
             WHERE {FILTER} \
             ORDER BY o.order_id, oi.order_item_id"
        );

        let found = sqlx::query(&sql)
            .bind(criteria.status().map(|status| status.as_str()))
            .bind(criteria.like_pattern())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)?;

        found
            .iter()
            .map(|row| {
                Ok(OrderGraphRow {
                    order: rows::order(row)?,
                    member: rows::member(row),
                    delivery: rows::delivery(row)?,
                    order_item: rows::order_item(row),
                    item: rows::item(row),
                })
            })
            .collect()
    }

    async fn order_items_in(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderItem>> {
        let found = sqlx::query(
            r"
            SELECT order_item_id, order_id, item_id, order_price, count
            FROM order_item
            WHERE order_id = ANY($1)
            ORDER BY order_item_id
            ",
        )
        .bind(raw_ids(order_ids, OrderId::get))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;

        Ok(found.iter().map(rows::order_item).collect())
    }

    async fn items_in(&mut self, item_ids: &[ItemId]) -> Result<Vec<Item>> {
        let found = sqlx::query(
            r"
            SELECT item_id, name AS item_name, price, stock_quantity
            FROM item
            WHERE item_id = ANY($1)
            ORDER BY item_id
            ",
        )
        .bind(raw_ids(item_ids, ItemId::get))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;

        Ok(found.iter().map(rows::item).collect())
    }

    async fn project_order_headers(
        &mut self,
        criteria: &OrderCriteria,
        window: Pagination,
    ) -> Result<Vec<OrderSummaryView>> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} \
             {ROOT_JOINS} \
             WHERE {FILTER} \
             ORDER BY o.order_id LIMIT $3 OFFSET $4"
        );
        let (limit, offset) = window_bounds(window);

        let found = sqlx::query(&sql)
            .bind(criteria.status().map(|status| status.as_str()))
            .bind(criteria.like_pattern())
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)?;

        found.iter().map(rows::summary).collect()
    }

    async fn project_order_lines(&mut self, order_ids: &[OrderId]) -> Result<Vec<OrderLineRow>> {
        let found = sqlx::query(
            r"
            SELECT oi.order_id, i.name AS item_name, oi.order_price, oi.count
            FROM order_item oi
            JOIN item i ON i.item_id = oi.item_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_item_id
            ",
        )
        .bind(raw_ids(order_ids, OrderId::get))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error)?;

        Ok(found.iter().map(rows::line).collect())
    }

    async fn project_flat_rows(&mut self, criteria: &OrderCriteria) -> Result<Vec<FlatOrderRow>> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS}, i.name AS item_name, oi.order_price, oi.count \
             {ROOT_JOINS} {LINE_JOINS} \
             WHERE {FILTER} \
             ORDER BY o.order_id, oi.order_item_id"
        );

        let found = sqlx::query(&sql)
            .bind(criteria.status().map(|status| status.as_str()))
            .bind(criteria.like_pattern())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error)?;

        found.iter().map(rows::flat).collect()
    }

    async fn finish(self) -> Result<()> {
        self.tx.commit().await.map_err(db_error)
    }
}
