//! Query layer configuration.
//!
//! Every tunable of the fetch strategies lives here. Values are provided by
//! the application; the defaults are only a starting point.

use crate::criteria::Pagination;
use crate::error::{QueryError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for [`crate::OrderQueries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum parent keys per batched IN-list query.
    ///
    /// Default: 100
    pub batch_size: usize,

    /// Row cap for root queries when the caller does not paginate.
    ///
    /// Default: 1000
    pub max_rows: u64,

    /// Largest `limit` a caller may request.
    ///
    /// Default: 1000
    pub max_page_limit: u64,

    /// `limit` used when the caller gives an offset but no limit.
    ///
    /// Default: 100
    pub default_page_limit: u64,
}

impl QueryConfig {
    /// Configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            batch_size: 100,
            max_rows: 1000,
            max_page_limit: 1000,
            default_page_limit: 100,
        }
    }

    /// Set the IN-list batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the unpaginated root row cap.
    #[must_use]
    pub const fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Set the largest accepted page limit.
    #[must_use]
    pub const fn with_max_page_limit(mut self, max_page_limit: u64) -> Self {
        self.max_page_limit = max_page_limit;
        self
    }

    /// Set the default page limit.
    #[must_use]
    pub const fn with_default_page_limit(mut self, default_page_limit: u64) -> Self {
        self.default_page_limit = default_page_limit;
        self
    }

    /// Check the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] if any value is zero or the
    /// default page limit exceeds the maximum.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(QueryError::validation("batch_size must be positive"));
        }
        if self.max_rows == 0 {
            return Err(QueryError::validation("max_rows must be positive"));
        }
        if self.max_page_limit == 0 {
            return Err(QueryError::validation("max_page_limit must be positive"));
        }
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(QueryError::validation(format!(
                "default_page_limit must be between 1 and {}",
                self.max_page_limit
            )));
        }
        Ok(())
    }

    /// Check a caller-supplied window against `max_page_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] if the limit is too large.
    pub fn check_page(&self, page: Pagination) -> Result<()> {
        if page.limit() > self.max_page_limit {
            return Err(QueryError::validation(format!(
                "limit {} exceeds the maximum of {}",
                page.limit(),
                self.max_page_limit
            )));
        }
        Ok(())
    }

    /// Resolve optional request parameters into a window.
    ///
    /// Both absent means no pagination. If only one is present the other
    /// takes its default (`offset` 0, `limit` `default_page_limit`).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ValidationFailed`] for negative or oversized values.
    pub fn page_from_params(&self, offset: Option<i64>, limit: Option<i64>) -> Result<Option<Pagination>> {
        if offset.is_none() && limit.is_none() {
            return Ok(None);
        }
        let default_limit = i64::try_from(self.default_page_limit).unwrap_or(i64::MAX);
        let page = Pagination::new(offset.unwrap_or(0), limit.unwrap_or(default_limit))?;
        self.check_page(page)?;
        Ok(Some(page))
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::new()
    }
}
