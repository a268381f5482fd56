//! Opening the Kasir database.
//!
//! ```text
//! DbConfig ──► Database::new ──► SqlitePool (WAL, foreign keys, busy timeout)
//!                   │                 │
//!                   ▼                 ├── products()   catalog and stock
//!             migrations::run         ├── fees()       marketplaces, admin fees
//!                                     ├── sales()      orders, line items
//!                                     └── summaries()  rekap harian
//! ```
//!
//! Readers never wait on the writer under WAL. Writers take SQLite's single
//! write lock, so two sales of the same variant are applied one after the
//! other and each sees the stock the previous one left.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::fee::FeeRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::summary::SummaryRepository;

const MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings for one SQLite file.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./data/kasir.db").max_connections(8)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Default: 5
    pub max_connections: u32,

    /// How long a request waits for a free connection. Default: 30 seconds
    pub acquire_timeout: Duration,

    /// How long a writer waits on SQLite's write lock before giving up with
    /// `database is locked`. Concurrent sales queue behind each other for at
    /// most this long. Default: 5 seconds
    pub busy_timeout: Duration,

    /// Apply pending migrations when the pool opens. Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Settings for the file at `path`, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// A private in-memory database for tests.
    ///
    /// Every connection to `:memory:` is its own database, so the pool is
    /// pinned to a single connection. Code holding a transaction must not
    /// touch the pool until it commits.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(MEMORY)
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY)
    }

    /// SQLite options: WAL journal, NORMAL synchronous, foreign keys on.
    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        // cascades from products to variants and orders to line items
        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the Kasir database; hands out repositories.
///
/// Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, migrates the schema.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening database"
        );

        let options = config.connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Pool connected");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for diagnostics such as [`migrations::migration_status`].
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Products, variants and stock.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Marketplaces and their admin fees.
    pub fn fees(&self) -> FeeRepository {
        FeeRepository::new(self.pool.clone())
    }

    /// Orders, line items and their reversal.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Daily per-marketplace rollups.
    pub fn summaries(&self) -> SummaryRepository {
        SummaryRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);

        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config() {
        let config = DbConfig::new("/tmp/kasir.db")
            .max_connections(10)
            .busy_timeout(Duration::from_secs(1))
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());

        let memory = DbConfig::in_memory();
        assert!(memory.is_in_memory());
        assert_eq!(memory.max_connections, 1);
    }
}
