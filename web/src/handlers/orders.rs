//! Order read endpoints.
//!
//! Query parameters are parsed here and handed to the facade unchanged;
//! every rule about pagination and strategies lives in the core.

use crate::{AppState, WebResult};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use order_query_core::{
    FetchStrategy, OrderCriteria, OrderId, OrderStatus, OrderStore, OrderSummaryView, OrderView,
    Pagination,
};
use serde::Deserialize;

/// Query string accepted by the list endpoints.
///
/// All fields are optional. `strategy` is ignored by `/api/simple-orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    /// Fetch strategy name, e.g. `fetch-join-batched`
    pub strategy: Option<String>,
    /// `PLACED` or `CANCELLED` (case-insensitive)
    pub status: Option<String>,
    /// Buyer-name substring
    pub buyer: Option<String>,
    /// Rows to skip
    pub offset: Option<i64>,
    /// Page size
    pub limit: Option<i64>,
}

impl OrderListParams {
    fn criteria(&self) -> WebResult<OrderCriteria> {
        let mut criteria = OrderCriteria::any();
        if let Some(status) = self.status.as_deref() {
            criteria = criteria.with_status(OrderStatus::parse(status)?);
        }
        if let Some(buyer) = &self.buyer {
            criteria = criteria.with_buyer_name(buyer.as_str());
        }
        Ok(criteria)
    }

    fn strategy(&self) -> WebResult<FetchStrategy> {
        Ok(self
            .strategy
            .as_deref()
            .map(FetchStrategy::parse)
            .transpose()?
            .unwrap_or_default())
    }

    fn page<S: OrderStore>(&self, state: &AppState<S>) -> WebResult<Option<Pagination>> {
        Ok(state
            .queries()
            .config()
            .page_from_params(self.offset, self.limit)?)
    }
}

/// List orders with their lines.
///
/// # Endpoint
///
/// ```text
/// GET /api/orders?strategy=&status=&buyer=&offset=&limit=
/// ```
///
/// # Errors
///
/// - 400 when a non-paginable strategy is asked for a page.
/// - 422 for an unknown strategy or status, or an invalid window.
/// - 503 when the store is unavailable.
pub async fn list_orders<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<OrderListParams>,
) -> WebResult<Json<Vec<OrderView>>> {
    let strategy = params.strategy()?;
    let criteria = params.criteria()?;
    let page = params.page(&state)?;

    let views = state
        .queries()
        .list_orders(&criteria, strategy, page)
        .await?;
    Ok(Json(views))
}

/// Load one order.
///
/// ```text
/// GET /api/orders/{id}
/// ```
///
/// # Errors
///
/// 404 when the order does not exist, 503 when the store is unavailable.
pub async fn get_order<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> WebResult<Json<OrderView>> {
    let view = state.queries().find_order(OrderId::new(id)).await?;
    Ok(Json(view))
}

/// List orders without their lines.
///
/// ```text
/// GET /api/simple-orders?status=&buyer=&offset=&limit=
/// ```
///
/// # Errors
///
/// 422 for an unknown status or an invalid window, 503 when the store is
/// unavailable.
pub async fn list_simple_orders<S: OrderStore + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<OrderListParams>,
) -> WebResult<Json<Vec<OrderSummaryView>>> {
    let criteria = params.criteria()?;
    let page = params.page(&state)?;

    let summaries = state
        .queries()
        .list_order_summaries(&criteria, page)
        .await?;
    Ok(Json(summaries))
}
