//! # kasir-core: Pure Business Logic for Kasir
//!
//! This crate holds the sale-to-revenue arithmetic and the domain types of
//! Kasir. Nothing in here touches a database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/server (axum JSON API)                     │   │
//! │  │    /api/products, /api/sales, /api/summaries, /api/fees         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │calculator │  │  rollup   │  │   │
//! │  │   │  Product  │  │   Money   │  │ fee/zakat │  │  daily    │  │   │
//! │  │   │  Order    │  │  FeeRate  │  │ net profit│  │  totals   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (Database Layer)                    │   │
//! │  │        SQLite repositories, stock transactions, migrations      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Variant, Order, LineItem, ...)
//! - [`money`] - Integer rupiah type and fee rates
//! - [`calculator`] - Per-line fee, zakat and net profit
//! - [`rollup`] - Grouping of a day's sales into per-marketplace totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::calculator::calculate_line;
//! use kasir_core::money::{FeeRate, Money};
//! use kasir_core::types::FeeRule;
//!
//! let fees = [FeeRule::percentage(FeeRate::from_bps(825))];
//! let line = calculate_line(Money::from_rupiah(50_000), Money::from_rupiah(30_000), 4, &fees)?;
//!
//! assert_eq!(line.total_fee.rupiah(), 16_500);
//! assert_eq!(line.zakat.rupiah(), 1_588);
//! assert_eq!(line.net_profit.rupiah(), 61_912);
//! # Ok::<(), kasir_core::ValidationError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod error;
pub mod money;
pub mod rollup;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calculator::{calculate_line, LineAmounts};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{FeeRate, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Zakat rate in basis points (2.5%), applied to positive gross profit.
pub const ZAKAT_RATE_BPS: u32 = 250;

/// Maximum quantity of a single sale line.
///
/// ## Business Reason
/// Catches typos such as 1000 instead of 10 before stock is touched.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum number of lines recorded under one order in a single call.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum unit price or fixed fee, in rupiah (Rp 100 miliar).
///
/// `MAX_PRICE * MAX_LINE_QUANTITY` stays far inside `i64`, so line totals
/// and a day's worth of them never overflow.
pub const MAX_PRICE: i64 = 100_000_000_000;

/// Maximum stock a variant can be given, or moved by in one adjustment.
pub const MAX_STOCK: i64 = 1_000_000_000;
