//! # kasir-db: Database Layer for Kasir
//!
//! This crate provides database access for Kasir. It uses SQLite with sqlx
//! for async operations, and owns every multi-statement transaction of the
//! system: recording a sale, reversing it, and archiving a day.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ FeeRepo       │    │ 001_initial  │  │   │
//! │  │   │               │    │ SaleRepo      │    │ 002_archived │  │   │
//! │  │   │               │    │ SummaryRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ calculate_line / summarize    │   │
//! │  │                                ▼                               │   │
//! │  │                           kasir-core                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("kasir.db")).await?;
//!
//! let order = db.sales().record_sale(&sale).await?;
//! let summaries = db.summaries().archive_date(date).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::fee::FeeRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{
    MarketplaceOrderCount, ResetOutcome, ReversalOutcome, SaleFilter, SaleRepository,
};
pub use repository::summary::{
    ArchiveOutcome, SummaryFilter, SummaryPage, SummaryRepository, SummaryTotals,
};
