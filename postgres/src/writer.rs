//! Write helpers used to seed data.
//!
//! Each operation runs in its own transaction and applies the model rules
//! (stock, price snapshot, cancellation) before touching the tables.

use crate::PgOrderStore;
use crate::rows::{self, db_error};
use chrono::{DateTime, Utc};
use order_query_core::{
    Address, DeliveryStatus, Item, ItemId, Member, MemberId, OrderDraft, OrderId, OrderItem,
    OrderItemId, OrderStatus, QueryError, Result,
};
use sqlx::{PgConnection, Row};

async fn lock_item(conn: &mut PgConnection, id: ItemId) -> Result<Item> {
    let row = sqlx::query(
        r"
        SELECT item_id, name AS item_name, price, stock_quantity
        FROM item
        WHERE item_id = $1
        FOR UPDATE
        ",
    )
    .bind(id.get())
    .fetch_optional(conn)
    .await
    .map_err(db_error)?;

    row.as_ref()
        .map(rows::item)
        .ok_or_else(|| QueryError::not_found("item", id.get()))
}

impl PgOrderStore {
    /// Register a member.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`] if the insert fails.
    pub async fn insert_member(&self, name: &str, address: &Address) -> Result<Member> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO member (name, city, street, zipcode)
            VALUES ($1, $2, $3, $4)
            RETURNING member_id
            ",
        )
        .bind(name)
        .bind(&address.city)
        .bind(&address.street)
        .bind(&address.zipcode)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Member {
            id: MemberId::new(id),
            name: name.to_string(),
            address: address.clone(),
        })
    }

    /// Add a catalog item.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`] if the insert fails.
    pub async fn insert_item(&self, name: &str, price: i64, stock_quantity: i32) -> Result<Item> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO item (name, price, stock_quantity)
            VALUES ($1, $2, $3)
            RETURNING item_id
            ",
        )
        .bind(name)
        .bind(price)
        .bind(stock_quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Item {
            id: ItemId::new(id),
            name: name.to_string(),
            price,
            stock_quantity,
        })
    }

    /// Change an item's catalog price. Existing order lines keep theirs.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] for an unknown item.
    /// - [`QueryError::StoreUnavailable`] if the update fails.
    pub async fn set_item_price(&self, id: ItemId, price: i64) -> Result<()> {
        let result = sqlx::query("UPDATE item SET price = $1 WHERE item_id = $2")
            .bind(price)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(QueryError::not_found("item", id.get()));
        }
        Ok(())
    }

    /// Place an order: copy the member's address into a new delivery,
    /// snapshot each item's price and take the quantities out of stock.
    ///
    /// # Errors
    ///
    /// - [`QueryError::ValidationFailed`] for an empty draft, a non-positive
    ///   quantity or insufficient stock.
    /// - [`QueryError::NotFound`] for an unknown member or item.
    /// - [`QueryError::StoreUnavailable`] on any database failure.
    pub async fn place_order(&self, draft: &OrderDraft, order_date: DateTime<Utc>) -> Result<OrderId> {
        draft.validate()?;
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let member_row = sqlx::query(
            r"
            SELECT member_id, name AS member_name, city AS member_city,
                   street AS member_street, zipcode AS member_zipcode
            FROM member
            WHERE member_id = $1
            ",
        )
        .bind(draft.member_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        let member = member_row
            .as_ref()
            .map(rows::member)
            .ok_or_else(|| QueryError::not_found("member", draft.member_id.get()))?;

        let (delivery_id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO delivery (city, street, zipcode, status)
            VALUES ($1, $2, $3, $4)
            RETURNING delivery_id
            ",
        )
        .bind(&member.address.city)
        .bind(&member.address.street)
        .bind(&member.address.zipcode)
        .bind(DeliveryStatus::Ready.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        let (order_id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO orders (member_id, delivery_id, order_date, status)
            VALUES ($1, $2, $3, $4)
            RETURNING order_id
            ",
        )
        .bind(member.id.get())
        .bind(delivery_id)
        .bind(order_date)
        .bind(OrderStatus::Placed.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        let order_id = OrderId::new(order_id);

        for (item_id, quantity) in &draft.lines {
            let mut item = lock_item(&mut tx, *item_id).await?;
            // the database assigns the real line id on insert
            let line = OrderItem::snapshot(OrderItemId::new(0), order_id, &item, *quantity)?;
            item.remove_stock(*quantity)?;

            sqlx::query("UPDATE item SET stock_quantity = $1 WHERE item_id = $2")
                .bind(item.stock_quantity)
                .bind(item.id.get())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            sqlx::query(
                r"
                INSERT INTO order_item (order_id, item_id, order_price, count)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id.get())
            .bind(line.item_id().get())
            .bind(line.unit_price())
            .bind(line.quantity())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(order_id = order_id.get(), lines = draft.lines.len(), "Placed order");
        Ok(order_id)
    }

    /// Cancel an order and put its quantities back into stock.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] for an unknown order.
    /// - [`QueryError::ValidationFailed`] if the delivery is completed or
    ///   the order is already cancelled.
    /// - [`QueryError::StoreUnavailable`] on any database failure.
    pub async fn cancel_order(&self, id: OrderId) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let row = sqlx::query(
            r"
            SELECT o.order_id, o.member_id, o.delivery_id, o.order_date, o.status,
                   d.city AS delivery_city, d.street AS delivery_street,
                   d.zipcode AS delivery_zipcode, d.status AS delivery_status
            FROM orders o
            JOIN delivery d ON d.delivery_id = o.delivery_id
            WHERE o.order_id = $1
            FOR UPDATE
            ",
        )
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| QueryError::not_found("order", id.get()))?;

        let mut order = rows::order(&row)?;
        let delivery = rows::delivery(&row)?;
        order.cancel(&delivery)?;

        sqlx::query("UPDATE orders SET status = $1 WHERE order_id = $2")
            .bind(order.status().as_str())
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query(
            r"
            UPDATE item i
            SET stock_quantity = i.stock_quantity + restored.quantity
            FROM (
                SELECT item_id, SUM(count)::integer AS quantity
                FROM order_item
                WHERE order_id = $1
                GROUP BY item_id
            ) restored
            WHERE i.item_id = restored.item_id
            ",
        )
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(order_id = id.get(), "Cancelled order");
        Ok(())
    }

    /// Mark an order's delivery as completed.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] for an unknown order.
    /// - [`QueryError::StoreUnavailable`] if the update fails.
    pub async fn complete_delivery(&self, order_id: OrderId) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE delivery d
            SET status = $1
            FROM orders o
            WHERE o.delivery_id = d.delivery_id AND o.order_id = $2
            ",
        )
        .bind(DeliveryStatus::Completed.as_str())
        .bind(order_id.get())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(QueryError::not_found("order", order_id.get()));
        }
        Ok(())
    }

    /// Current stock of an item.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] for an unknown item.
    /// - [`QueryError::StoreUnavailable`] if the query fails.
    pub async fn stock_of(&self, id: ItemId) -> Result<i32> {
        let row = sqlx::query("SELECT stock_quantity FROM item WHERE item_id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| QueryError::not_found("item", id.get()))?;

        Ok(row.get("stock_quantity"))
    }
}
