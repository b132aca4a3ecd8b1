//! Interchangeable order fetch strategies.
//!
//! Every strategy produces the same logical result for the same criteria:
//! the matching orders ascending by id, each with its lines ascending by
//! order-item id. They differ in how many round trips they issue, how many
//! duplicated bytes they transfer and whether an offset/limit window can be
//! applied to their root query.
//!
//! Strategies are plain async functions over an [`OrderReader`]. The facade
//! owns the session and hands it to [`execute`].

mod entity;
mod fetch_join;
mod projection;

pub(crate) use fetch_join::assemble_graphs;

use crate::criteria::{OrderCriteria, Pagination};
use crate::error::{QueryError, Result};
use crate::loader::BatchLoader;
use crate::store::OrderReader;
use crate::view::OrderView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects the algorithm used to assemble order views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Load orders, then every relation one lookup at a time.
    EntityGraph,
    /// As [`FetchStrategy::EntityGraph`], converting each order to a view as
    /// soon as it is loaded.
    EntityToView,
    /// One query joining the whole graph. Not paginable.
    FetchJoinGraph,
    /// One query for orders with their to-one relations, then batched
    /// IN-lists for lines and items.
    #[default]
    FetchJoinBatched,
    /// Projected headers, then one line projection per order.
    ProjectionPerOrder,
    /// Projected headers, then one line projection for all of them.
    ProjectionBatched,
    /// One flat projection of the whole graph. Not paginable.
    ProjectionFlat,
}

impl FetchStrategy {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::EntityGraph,
        Self::EntityToView,
        Self::FetchJoinGraph,
        Self::FetchJoinBatched,
        Self::ProjectionPerOrder,
        Self::ProjectionBatched,
        Self::ProjectionFlat,
    ];

    /// Whether an offset/limit window can be applied.
    ///
    /// False for strategies whose single query joins a to-many relation:
    /// windowing multiplied rows would cut an order's lines apart.
    #[must_use]
    pub const fn supports_pagination(&self) -> bool {
        !matches!(self, Self::FetchJoinGraph | Self::ProjectionFlat)
    }

    /// Stable kebab-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EntityGraph => "entity-graph",
            Self::EntityToView => "entity-to-view",
            Self::FetchJoinGraph => "fetch-join-graph",
            Self::FetchJoinBatched => "fetch-join-batched",
            Self::ProjectionPerOrder => "projection-per-order",
            Self::ProjectionBatched => "projection-batched",
            Self::ProjectionFlat => "projection-flat",
        }
    }

    /// Parse a strategy name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == name.trim())
            .ok_or_else(|| QueryError::validation(format!("Unknown fetch strategy: {name}")))
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchStrategy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FetchPlan<'a> {
    pub criteria: &'a OrderCriteria,
    /// Window over the root query. Ignored by non-paginable strategies.
    pub window: Pagination,
    pub loader: BatchLoader,
}

/// Run `strategy` against an open session.
pub(crate) async fn execute<R: OrderReader>(
    strategy: FetchStrategy,
    reader: &mut R,
    plan: &FetchPlan<'_>,
) -> Result<Vec<OrderView>> {
    match strategy {
        FetchStrategy::EntityGraph => Ok(entity::load_graphs(reader, plan)
            .await?
            .into_iter()
            .map(OrderView::from)
            .collect()),
        FetchStrategy::EntityToView => entity::load_views(reader, plan).await,
        FetchStrategy::FetchJoinGraph => fetch_join::full_graph(reader, plan).await,
        FetchStrategy::FetchJoinBatched => fetch_join::batched(reader, plan).await,
        FetchStrategy::ProjectionPerOrder => projection::per_order(reader, plan).await,
        FetchStrategy::ProjectionBatched => projection::batched(reader, plan).await,
        FetchStrategy::ProjectionFlat => projection::flat(reader, plan).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for strategy in FetchStrategy::ALL {
            assert_eq!(FetchStrategy::parse(strategy.as_str()).ok(), Some(strategy));
            assert_eq!(strategy.to_string(), strategy.as_str());
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            "lazy".parse::<FetchStrategy>(),
            Err(QueryError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_pagination_support() {
        let unpaginated: Vec<FetchStrategy> = FetchStrategy::ALL
            .into_iter()
            .filter(|strategy| !strategy.supports_pagination())
            .collect();
        assert_eq!(
            unpaginated,
            vec![FetchStrategy::FetchJoinGraph, FetchStrategy::ProjectionFlat]
        );
    }

    #[test]
    fn test_default_is_batched_fetch_join() {
        assert_eq!(FetchStrategy::default(), FetchStrategy::FetchJoinBatched);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FetchStrategy::ProjectionPerOrder).ok();
        assert_eq!(json.as_deref(), Some("\"projection-per-order\""));
    }
}
