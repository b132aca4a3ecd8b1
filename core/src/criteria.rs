//! Filter criteria and pagination window for order queries.

use crate::error::{QueryError, Result};
use crate::model::OrderStatus;
use serde::{Deserialize, Serialize};

/// Immutable filter for order searches.
///
/// Both filters are optional and combine with AND. An empty criteria matches
/// every order.
///
/// # Example
///
/// ```
/// use order_query_core::{OrderCriteria, OrderStatus};
///
/// let criteria = OrderCriteria::any()
///     .with_status(OrderStatus::Placed)
///     .with_buyer_name("spring");
///
/// assert!(criteria.matches(OrderStatus::Placed, "springfield"));
/// assert!(!criteria.matches(OrderStatus::Cancelled, "springfield"));
/// assert!(!criteria.matches(OrderStatus::Placed, "Spring"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCriteria {
    status: Option<OrderStatus>,
    buyer_name_contains: Option<String>,
}

impl OrderCriteria {
    /// Criteria matching every order.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            status: None,
            buyer_name_contains: None,
        }
    }

    /// Only orders with exactly this status.
    #[must_use]
    pub const fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Only orders whose buyer name contains `needle` (case-sensitive).
    ///
    /// A blank needle leaves the filter unset.
    #[must_use]
    pub fn with_buyer_name(mut self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.buyer_name_contains = if needle.trim().is_empty() {
            None
        } else {
            Some(needle)
        };
        self
    }

    /// Status filter, if any.
    #[must_use]
    pub const fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    /// Buyer-name substring filter, if any.
    #[must_use]
    pub fn buyer_name_contains(&self) -> Option<&str> {
        self.buyer_name_contains.as_deref()
    }

    /// Evaluate the criteria against an order's status and buyer name.
    #[must_use]
    pub fn matches(&self, status: OrderStatus, buyer_name: &str) -> bool {
        self.status.is_none_or(|wanted| wanted == status)
            && self
                .buyer_name_contains
                .as_deref()
                .is_none_or(|needle| buyer_name.contains(needle))
    }

    /// `LIKE` pattern for the buyer-name filter.
    ///
    /// Wildcards and the escape character inside the needle are escaped with
    /// `\` so the needle matches literally.
    ///
    /// ```
    /// use order_query_core::OrderCriteria;
    ///
    /// let criteria = OrderCriteria::any().with_buyer_name("50%_off");
    /// assert_eq!(criteria.like_pattern().as_deref(), Some(r"%50\%\_off%"));
    /// ```
    #[must_use]
    pub fn like_pattern(&self) -> Option<String> {
        self.buyer_name_contains.as_deref().map(|needle| {
            let mut pattern = String::with_capacity(needle.len() + 2);
            pattern.push('%');
            for c in needle.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

/// A validated offset/limit window over a root query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    offset: u64,
    limit: u64,
}

impl Pagination {
    /// Validate a caller-supplied window.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] if `offset` is negative or
    /// `limit` is not positive.
    pub fn new(offset: i64, limit: i64) -> Result<Self> {
        let offset = u64::try_from(offset)
            .map_err(|_| QueryError::validation(format!("offset must not be negative, got {offset}")))?;
        let limit = u64::try_from(limit)
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or_else(|| QueryError::validation(format!("limit must be positive, got {limit}")))?;
        Ok(Self { offset, limit })
    }

    /// The first `limit` rows.
    #[must_use]
    pub const fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Maximum rows to return.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// The window directly after this one, same size.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            limit: self.limit,
        }
    }

    /// Apply the window to an already ordered sequence.
    pub fn apply<T>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        rows.into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }
}
