//! Direct projections: the store returns view fields, never entities.

use super::FetchPlan;
use crate::assembler::{attach_lines, group_flat_rows};
use crate::error::Result;
use crate::model::OrderId;
use crate::store::OrderReader;
use crate::view::OrderView;

/// Headers, then one line query per header. `1 + N` round trips.
pub(super) async fn per_order<R: OrderReader>(
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderView>> {
    let headers = reader.project_order_headers(plan.criteria, plan.window).await?;

    let mut lines = Vec::new();
    for header in &headers {
        lines.extend(reader.project_order_lines(&[header.id]).await?);
    }

    Ok(attach_lines(headers, lines))
}

/// Headers, then every line in one IN-list query. Two round trips, one when
/// no header matches.
pub(super) async fn batched<R: OrderReader>(
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderView>> {
    let headers = reader.project_order_headers(plan.criteria, plan.window).await?;
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<OrderId> = headers.iter().map(|header| header.id).collect();
    let lines = reader.project_order_lines(&order_ids).await?;

    Ok(attach_lines(headers, lines))
}

/// One flat query, regrouped in memory. Not paginable.
pub(super) async fn flat<R: OrderReader>(
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderView>> {
    let rows = reader.project_flat_rows(plan.criteria).await?;
    tracing::debug!(rows = rows.len(), "Grouping flat projection rows");
    Ok(group_flat_rows(rows))
}
