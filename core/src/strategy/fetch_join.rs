//! Fetch-join strategies.
//!
//! `full_graph` joins everything in one query and folds the multiplied rows
//! back together. `batched` only joins the to-one edges, so its root query
//! can be windowed, and loads the collections through the [`BatchLoader`].

use super::FetchPlan;
use crate::assembler::fold_graph_rows;
use crate::error::{QueryError, Result};
use crate::loader::BatchLoader;
use crate::model::{ItemId, OrderGraph, OrderId, OrderLine};
use crate::store::{OrderReader, OrderRoot};
use crate::view::OrderView;

/// One round trip, no window.
pub(super) async fn full_graph<R: OrderReader>(
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderView>> {
    let rows = reader.search_order_graph(plan.criteria).await?;
    tracing::debug!(rows = rows.len(), "Folding fetch-join rows");
    Ok(fold_graph_rows(rows).into_iter().map(OrderView::from).collect())
}

/// `1 + ceil(N/B) + ceil(distinct_items/B)` round trips.
pub(super) async fn batched<R: OrderReader>(
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderView>> {
    let roots = reader.search_order_roots(plan.criteria, plan.window).await?;
    let graphs = assemble_graphs(reader, plan.loader, roots).await?;
    Ok(graphs.into_iter().map(OrderView::from).collect())
}

/// Load lines and items for already fetched roots.
///
/// Root order is kept. Item ids are requested in first-seen order across
/// all roots.
pub(crate) async fn assemble_graphs<R: OrderReader>(
    reader: &mut R,
    loader: BatchLoader,
    roots: Vec<OrderRoot>,
) -> Result<Vec<OrderGraph>> {
    let order_ids: Vec<OrderId> = roots.iter().map(|root| root.order.id()).collect();
    let mut items_by_order = loader.order_items(reader, &order_ids).await?;

    let item_ids: Vec<ItemId> = order_ids
        .iter()
        .filter_map(|id| items_by_order.get(id))
        .flatten()
        .map(|order_item| order_item.item_id())
        .collect();
    let items = loader.items(reader, &item_ids).await?;

    roots
        .into_iter()
        .map(|root| {
            let order_items = items_by_order.remove(&root.order.id()).unwrap_or_default();
            let lines = order_items
                .into_iter()
                .map(|order_item| {
                    let item = items
                        .get(&order_item.item_id())
                        .cloned()
                        .ok_or_else(|| QueryError::not_found("item", order_item.item_id().get()))?;
                    Ok(OrderLine { order_item, item })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(OrderGraph {
                order: root.order,
                member: root.member,
                delivery: root.delivery,
                lines,
            })
        })
        .collect()
}
