//! Naive entity loading: every relation is its own lookup.
//!
//! Round trips: `1 + 3N + sum(lines)` for N orders. Kept as the correctness
//! baseline the other strategies are compared against.

use super::FetchPlan;
use crate::error::{QueryError, Result};
use crate::model::{Order, OrderGraph, OrderLine};
use crate::store::OrderReader;
use crate::view::OrderView;

/// Load every matching order as a full entity graph.
pub(super) async fn load_graphs<R: OrderReader>(
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderGraph>> {
    let orders = reader.search_orders(plan.criteria, plan.window).await?;

    let mut graphs = Vec::with_capacity(orders.len());
    for order in orders {
        graphs.push(load_relations(reader, order).await?);
    }
    Ok(graphs)
}

/// Same retrieval as [`load_graphs`], but each graph becomes a view before
/// the next order is touched.
pub(super) async fn load_views<R: OrderReader>(
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderView>> {
    let orders = reader.search_orders(plan.criteria, plan.window).await?;

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let graph = load_relations(reader, order).await?;
        views.push(OrderView::from(graph));
    }
    Ok(views)
}

async fn load_relations<R: OrderReader>(reader: &mut R, order: Order) -> Result<OrderGraph> {
    let member = reader
        .find_member(order.member_id())
        .await?
        .ok_or_else(|| QueryError::not_found("member", order.member_id().get()))?;
    let delivery = reader
        .find_delivery(order.delivery_id())
        .await?
        .ok_or_else(|| QueryError::not_found("delivery", order.delivery_id().get()))?;

    let order_items = reader.find_order_items(order.id()).await?;
    let mut lines = Vec::with_capacity(order_items.len());
    for order_item in order_items {
        let item = reader
            .find_item(order_item.item_id())
            .await?
            .ok_or_else(|| QueryError::not_found("item", order_item.item_id().get()))?;
        lines.push(OrderLine { order_item, item });
    }

    Ok(OrderGraph {
        order,
        member,
        delivery,
        lines,
    })
}
