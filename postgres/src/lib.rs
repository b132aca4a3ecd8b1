//! `PostgreSQL` order store for the order query layer.
//!
//! This crate provides the production [`OrderStore`] implementation on top of
//! sqlx. It supports:
//!
//! - One `READ ONLY` transaction per read session
//! - Filtered, windowed root queries and `= ANY($1)` batched lookups
//! - Connection pooling (acquire timeout is the only retry/timeout policy)
//! - Embedded migrations for the `member`, `item`, `delivery`, `orders` and
//!   `order_item` tables
//! - Write helpers that apply the model's placement and cancellation rules
//!
//! # Example
//!
//! ```ignore
//! use order_query_postgres::PgOrderStore;
//! use order_query_core::{OrderQueries, QueryConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PgOrderStore::connect("postgres://localhost/orders", 10).await?;
//!     store.migrate().await?;
//!     let queries = OrderQueries::new(store, QueryConfig::default())?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod reader;
mod rows;
mod writer;

pub use reader::PgOrderReader;

use order_query_core::{OrderStore, QueryError, Result};
use rows::db_error;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// How long a request waits for a pooled connection before failing with
/// [`QueryError::StoreUnavailable`].
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// `PostgreSQL`-backed [`OrderStore`].
///
/// Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`] if the database cannot be
    /// reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await
            .map_err(db_error)?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StoreUnavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| QueryError::StoreUnavailable(format!("Migration failed: {e}")))?;

        tracing::info!("Order tables migrated");
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl OrderStore for PgOrderStore {
    type Reader = PgOrderReader;

    async fn begin_read(&self) -> Result<PgOrderReader> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        Ok(PgOrderReader::new(tx))
    }
}
