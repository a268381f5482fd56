//! # Repository Module
//!
//! Database repository implementations for Kasir.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.sales().record_sale(&sale)                                 │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── begin_write(&pool)      one BEGIN IMMEDIATE per operation         │
//! │  ├── FeeRepository rules     read inside the same transaction          │
//! │  ├── ProductRepository stock compare-and-decrement                     │
//! │  └── tx.commit()             or rollback on any error (drop)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Helpers shared between repositories take a `&mut SqliteConnection` so the
//! caller decides whether they run on a pooled connection or inside an open
//! transaction.
//!
//! ## Write Transactions
//! A deferred `BEGIN` takes a read snapshot first and upgrades to the write
//! lock at its first write. Under WAL that upgrade fails with
//! `SQLITE_BUSY_SNAPSHOT` as soon as another connection committed in
//! between, and the busy timeout does not retry it. Every transaction that
//! reads and then writes is therefore opened with [`begin_write`]:
//!
//! ```text
//! conn A  BEGIN IMMEDIATE ─ read ─ write ─ COMMIT
//! conn B        BEGIN IMMEDIATE (waits, up to busy_timeout) ─ read ─ write ─ COMMIT
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog and variant stock
//! - [`FeeRepository`](fee::FeeRepository) - Marketplaces and admin fees
//! - [`SaleRepository`](sale::SaleRepository) - Recording and reversing sales
//! - [`SummaryRepository`](summary::SummaryRepository) - Daily rollups and rekap

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::error::DbResult;

pub mod fee;
pub mod product;
pub mod sale;
pub mod summary;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current timestamp for `created_at` / `updated_at` columns.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Opens a transaction that holds SQLite's write lock from its first
/// statement.
///
/// Concurrent callers queue on the lock (bounded by the pool's busy timeout)
/// instead of failing with `database is locked` halfway through.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
