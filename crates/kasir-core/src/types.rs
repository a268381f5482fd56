//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │──►│    Variant      │◄──│    LineItem     │       │
//! │  │  ─────────────  │ 1:n ─────────────  │   │  ─────────────  │       │
//! │  │  code (unique)  │   │  color          │   │  quantity       │       │
//! │  │  sell/cost      │   │  stock (>= 0)   │   │  fee/zakat/net  │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                        │ n:1            │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │    AdminFee     │   │  DailySummary   │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  marketplace    │   │  marketplace    │   │  order_code     │       │
//! │  │  kind / value   │   │  date, totals   │   │  marketplace    │       │
//! │  └─────────────────┘   └─────────────────┘   │  date           │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every persisted entity has a UUID v4 `id`. Products and orders also carry
//! a human-facing business key (`code`, `order_code`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{FeeRate, Money};

// =============================================================================
// Fees
// =============================================================================

/// How a marketplace admin fee is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FeeKind {
    /// Percentage of the unit sell price, value in basis points.
    Percentage,
    /// Fixed rupiah amount per unit.
    Fixed,
}

/// One fee rule as consumed by the line calculator.
///
/// `value` is basis points for [`FeeKind::Percentage`] and rupiah for
/// [`FeeKind::Fixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeRule {
    pub kind: FeeKind,
    pub value: i64,
}

impl FeeRule {
    /// A percentage-of-price rule.
    pub const fn percentage(rate: FeeRate) -> Self {
        FeeRule {
            kind: FeeKind::Percentage,
            value: rate.bps() as i64,
        }
    }

    /// A fixed per-unit rule.
    pub const fn fixed(amount: Money) -> Self {
        FeeRule {
            kind: FeeKind::Fixed,
            value: amount.rupiah(),
        }
    }
}

/// A configured marketplace admin fee row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdminFee {
    pub id: String,
    /// Marketplace name this fee applies to (e.g. "Shopee").
    pub marketplace: String,
    /// Human label, e.g. "Biaya Layanan".
    pub label: String,
    pub kind: FeeKind,
    /// Basis points for percentage fees, rupiah for fixed fees.
    pub value: i64,
    /// Inactive fees are kept for reference but not charged.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl AdminFee {
    /// Returns the calculator rule for this fee.
    #[inline]
    pub fn rule(&self) -> FeeRule {
        FeeRule {
            kind: self.kind,
            value: self.value,
        }
    }
}

/// Input for a new admin fee as typed into the fee form.
///
/// `value` is a percentage (`8.25`) for [`FeeKind::Percentage`] and rupiah
/// for [`FeeKind::Fixed`]; it is converted with
/// [`fee_rule_from_input`](crate::validation::fee_rule_from_input).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewAdminFee {
    pub marketplace: String,
    pub label: String,
    pub kind: FeeKind,
    pub value: f64,
}

/// A sales channel ("Shopee", "Tokopedia", "Offline", ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Marketplace {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// User-assigned product code, unique across the catalog but editable.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Default unit sell price in rupiah.
    pub sell_price: i64,

    /// Default unit cost price in rupiah.
    pub cost_price: i64,

    /// Stock used only when the product has no variants.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the default sell price as Money.
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_rupiah(self.sell_price)
    }

    /// Returns the default cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_rupiah(self.cost_price)
    }
}

/// A color/option of a product with its own stock counter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Variant {
    pub id: String,
    pub product_id: String,
    pub color: String,
    /// Never negative.
    pub stock: i64,
}

/// A product together with its variants.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductDetail {
    pub product: Product,
    pub variants: Vec<Variant>,
}

impl ProductDetail {
    /// Sellable stock: the sum of variant stock, or the product's own stock
    /// when it has no variants.
    pub fn total_stock(&self) -> i64 {
        if self.variants.is_empty() {
            self.product.stock
        } else {
            self.variants.iter().map(|v| v.stock).sum()
        }
    }
}

/// Input for creating or replacing a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub sell_price: i64,
    pub cost_price: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub variants: Vec<NewVariant>,
}

/// Input for one variant of a [`NewProduct`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewVariant {
    pub color: String,
    pub stock: i64,
}

// =============================================================================
// Sales
// =============================================================================

/// A customer order grouping one or more sold lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Order code as issued by the marketplace; unique per marketplace.
    pub order_code: String,
    pub marketplace: String,
    /// Business date of the sale.
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sold line of an order.
///
/// Product code, product name and variant color are snapshots taken at sale
/// time so that history survives catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub variant_id: String,
    pub product_code: String,
    pub product_name: String,
    pub color: String,
    pub quantity: i64,
    /// Unit sell price in rupiah.
    pub sell_price: i64,
    /// Unit cost price in rupiah.
    pub cost_price: i64,
    /// Fee for the whole line.
    pub total_fee: i64,
    /// Zakat for the whole line.
    pub zakat: i64,
    /// Net profit for the whole line.
    pub net_profit: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<LineItem>,
}

/// One requested sale line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub variant_id: String,
    pub quantity: i64,
    pub sell_price: i64,
    pub cost_price: i64,
}

/// A request to record a sale under an order code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub order_code: String,
    pub marketplace: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// Rollup
// =============================================================================

/// Per-marketplace totals of one business day.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySummary {
    pub id: String,
    pub marketplace: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Indonesian weekday name ("Senin", ...).
    pub day_name: String,
    pub total_units: i64,
    pub total_sell: i64,
    pub total_cost: i64,
    pub total_fee: i64,
    pub total_zakat: i64,
    pub total_net_profit: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(stock: i64) -> Variant {
        Variant {
            id: "v".to_string(),
            product_id: "p".to_string(),
            color: "Hitam".to_string(),
            stock,
        }
    }

    fn product(stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p".to_string(),
            code: "GMS-01".to_string(),
            name: "Gamis Polos".to_string(),
            sell_price: 120_000,
            cost_price: 80_000,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_fee_rule_constructors() {
        let pct = FeeRule::percentage(FeeRate::from_bps(825));
        assert_eq!(pct.kind, FeeKind::Percentage);
        assert_eq!(pct.value, 825);

        let fixed = FeeRule::fixed(Money::from_rupiah(1_250));
        assert_eq!(fixed.kind, FeeKind::Fixed);
        assert_eq!(fixed.value, 1_250);
    }

    #[test]
    fn test_fee_kind_serializes_lowercase() {
        let json = serde_json::to_string(&FeeKind::Percentage).unwrap();
        assert_eq!(json, "\"percentage\"");
        let kind: FeeKind = serde_json::from_str("\"fixed\"").unwrap();
        assert_eq!(kind, FeeKind::Fixed);
    }

    #[test]
    fn test_total_stock_prefers_variants() {
        let detail = ProductDetail {
            product: product(99),
            variants: vec![variant(3), variant(4), variant(0)],
        };
        assert_eq!(detail.total_stock(), 7);

        let plain = ProductDetail {
            product: product(12),
            variants: vec![],
        };
        assert_eq!(plain.total_stock(), 12);
    }

    #[test]
    fn test_new_product_defaults() {
        let input: NewProduct = serde_json::from_str(
            r#"{"code":"GMS-01","name":"Gamis","sell_price":100,"cost_price":60}"#,
        )
        .unwrap();
        assert_eq!(input.stock, 0);
        assert!(input.variants.is_empty());
    }
}
