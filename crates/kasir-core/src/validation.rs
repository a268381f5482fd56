//! # Validation Module
//!
//! Input validation for Kasir requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository entry (kasir-db)                                  │
//! │  └── THIS MODULE: whole request checked before any write               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (product code, marketplace+order code, marketplace+date)   │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  └── Foreign keys with cascade                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("GMS-01").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::{FeeRate, Money};
use crate::types::{FeeKind, FeeRule, NewProduct, NewSale};
use crate::{MAX_LINE_QUANTITY, MAX_PRICE, MAX_SALE_LINES, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// 100% in basis points.
const MAX_PERCENTAGE_BPS: i64 = 10_000;

// =============================================================================
// String Validators
// =============================================================================

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_product_code;
///
/// assert!(validate_product_code("GMS-01").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("GMS 01").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    validate_text("code", code, 50)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1 to 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a variant color label (1 to 50 characters).
pub fn validate_color(color: &str) -> ValidationResult<()> {
    validate_text("color", color, 50)
}

/// Validates a marketplace order code (1 to 100 characters).
pub fn validate_order_code(code: &str) -> ValidationResult<()> {
    validate_text("order_code", code, 100)
}

/// Validates a marketplace name (1 to 50 characters).
pub fn validate_marketplace_name(name: &str) -> ValidationResult<()> {
    validate_text("marketplace", name, 50)
}

/// Validates an admin fee label (1 to 100 characters).
pub fn validate_fee_label(label: &str) -> ValidationResult<()> {
    validate_text("label", label, 100)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in rupiah. Zero is allowed (free gifts).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed [`MAX_PRICE`]
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_price;
///
/// assert!(validate_price("sell_price", 50_000).is_ok());
/// assert!(validate_price("sell_price", 0).is_ok());
/// assert!(validate_price("sell_price", -1).is_err());
/// assert!(validate_price("sell_price", i64::MAX / 2).is_err());
/// ```
pub fn validate_price(field: &str, rupiah: i64) -> ValidationResult<()> {
    if rupiah < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if rupiah > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }

    Ok(())
}

/// Validates a stock count (`0..=MAX_STOCK`).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    if stock > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a manual stock adjustment: at most [`MAX_STOCK`] units either way.
///
/// ```rust
/// use kasir_core::validation::validate_stock_delta;
///
/// assert!(validate_stock_delta(-3).is_ok());
/// assert!(validate_stock_delta(i64::MIN).is_err());
/// ```
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    match delta.checked_abs() {
        Some(units) if units <= MAX_STOCK => Ok(()),
        _ => Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK,
            max: MAX_STOCK,
        }),
    }
}

/// Validates a stored fee value for its kind.
///
/// Percentage values are basis points in `0..=10000`; fixed values are
/// rupiah in `0..=MAX_PRICE`.
pub fn validate_fee(kind: FeeKind, value: i64) -> ValidationResult<()> {
    match kind {
        FeeKind::Percentage if !(0..=MAX_PERCENTAGE_BPS).contains(&value) => {
            Err(ValidationError::OutOfRange {
                field: "value".to_string(),
                min: 0,
                max: MAX_PERCENTAGE_BPS,
            })
        }
        FeeKind::Fixed => validate_price("value", value),
        _ => Ok(()),
    }
}

/// Builds a fee rule from the value typed into the fee form.
///
/// Percentages arrive as percent (`8.25`), fixed fees as rupiah.
///
/// ## Example
/// ```rust
/// use kasir_core::types::FeeKind;
/// use kasir_core::validation::fee_rule_from_input;
///
/// let rule = fee_rule_from_input(FeeKind::Percentage, 8.25).unwrap();
/// assert_eq!(rule.value, 825);
/// assert!(fee_rule_from_input(FeeKind::Percentage, 120.0).is_err());
/// ```
pub fn fee_rule_from_input(kind: FeeKind, value: f64) -> ValidationResult<FeeRule> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "value".to_string(),
            reason: "must be a number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: "value".to_string(),
        });
    }

    let rule = match kind {
        FeeKind::Percentage => {
            if value * 100.0 > MAX_PERCENTAGE_BPS as f64 {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 0,
                    max: 100,
                });
            }
            FeeRule::percentage(FeeRate::from_percentage(value))
        }
        FeeKind::Fixed => {
            if value.round() > MAX_PRICE as f64 {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 0,
                    max: MAX_PRICE,
                });
            }
            FeeRule::fixed(Money::from_rupiah(value.round() as i64))
        }
    };

    validate_fee(rule.kind, rule.value)?;
    Ok(rule)
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a product create/update request, including its variants.
///
/// Variant colors must be unique within the product (case-insensitive).
pub fn validate_new_product(input: &NewProduct) -> ValidationResult<()> {
    validate_product_code(&input.code)?;
    validate_product_name(&input.name)?;
    validate_price("sell_price", input.sell_price)?;
    validate_price("cost_price", input.cost_price)?;
    validate_stock(input.stock)?;

    let mut seen = HashSet::new();
    for variant in &input.variants {
        validate_color(&variant.color)?;
        validate_stock(variant.stock)?;

        if !seen.insert(variant.color.trim().to_lowercase()) {
            return Err(ValidationError::Duplicate {
                field: "color".to_string(),
                value: variant.color.trim().to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a sale request as a whole, before any stock is touched.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use kasir_core::types::{NewSale, SaleLine};
/// use kasir_core::validation::validate_new_sale;
///
/// let sale = NewSale {
///     order_code: "SHP-240301-001".to_string(),
///     marketplace: "Shopee".to_string(),
///     date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
///     lines: vec![],
/// };
/// assert!(validate_new_sale(&sale).is_err()); // no lines
/// ```
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_order_code(&sale.order_code)?;
    validate_marketplace_name(&sale.marketplace)?;

    if sale.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    if sale.lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for line in &sale.lines {
        validate_uuid(&line.variant_id)?;
        validate_quantity(line.quantity)?;
        validate_price("sell_price", line.sell_price)?;
        validate_price("cost_price", line.cost_price)?;
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewVariant, SaleLine};
    use chrono::NaiveDate;

    const VARIANT_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn product() -> NewProduct {
        NewProduct {
            code: "GMS-01".to_string(),
            name: "Gamis Polos".to_string(),
            sell_price: 120_000,
            cost_price: 80_000,
            stock: 0,
            variants: vec![
                NewVariant {
                    color: "Hitam".to_string(),
                    stock: 5,
                },
                NewVariant {
                    color: "Navy".to_string(),
                    stock: 2,
                },
            ],
        }
    }

    fn sale(lines: Vec<SaleLine>) -> NewSale {
        NewSale {
            order_code: "SHP-001".to_string(),
            marketplace: "Shopee".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            lines,
        }
    }

    fn line(quantity: i64, sell_price: i64) -> SaleLine {
        SaleLine {
            variant_id: VARIANT_ID.to_string(),
            quantity,
            sell_price,
            cost_price: 30_000,
        }
    }

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("GMS-01").is_ok());
        assert!(validate_product_code("khimar_02").is_ok());

        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code("has space").is_err());
        assert!(validate_product_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_fee() {
        assert!(validate_fee(FeeKind::Percentage, 825).is_ok());
        assert!(validate_fee(FeeKind::Percentage, 10_000).is_ok());
        assert!(validate_fee(FeeKind::Percentage, 10_001).is_err());
        assert!(validate_fee(FeeKind::Percentage, -1).is_err());
        assert!(validate_fee(FeeKind::Fixed, 1_250_000).is_ok());
        assert!(validate_fee(FeeKind::Fixed, MAX_PRICE).is_ok());
        assert!(validate_fee(FeeKind::Fixed, -1).is_err());
        assert!(matches!(
            validate_fee(FeeKind::Fixed, MAX_PRICE + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_price_upper_bound() {
        assert!(validate_price("sell_price", MAX_PRICE).is_ok());
        assert!(matches!(
            validate_price("sell_price", MAX_PRICE + 1),
            Err(ValidationError::OutOfRange { ref field, max: MAX_PRICE, .. }) if field == "sell_price"
        ));
        assert!(validate_price("cost_price", i64::MAX).is_err());
    }

    #[test]
    fn test_stock_bounds() {
        assert!(validate_stock(MAX_STOCK).is_ok());
        assert!(validate_stock(MAX_STOCK + 1).is_err());

        assert!(validate_stock_delta(MAX_STOCK).is_ok());
        assert!(validate_stock_delta(-MAX_STOCK).is_ok());
        assert!(validate_stock_delta(MAX_STOCK + 1).is_err());
        assert!(matches!(
            validate_stock_delta(i64::MIN),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_fee_rule_from_input() {
        let rule = fee_rule_from_input(FeeKind::Fixed, 1_250.4).unwrap();
        assert_eq!(rule, FeeRule::fixed(Money::from_rupiah(1_250)));

        assert!(fee_rule_from_input(FeeKind::Fixed, -5.0).is_err());
        assert!(fee_rule_from_input(FeeKind::Fixed, 1e300).is_err());
        assert!(fee_rule_from_input(FeeKind::Percentage, f64::NAN).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        assert!(validate_new_product(&product()).is_ok());

        let mut negative = product();
        negative.cost_price = -1;
        assert!(matches!(
            validate_new_product(&negative),
            Err(ValidationError::Negative { .. })
        ));

        let mut duplicate = product();
        duplicate.variants[1].color = " hitam ".to_string();
        assert!(matches!(
            validate_new_product(&duplicate),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_validate_new_sale() {
        assert!(validate_new_sale(&sale(vec![line(2, 50_000)])).is_ok());

        assert!(validate_new_sale(&sale(vec![])).is_err());
        assert!(validate_new_sale(&sale(vec![line(2, 50_000), line(0, 50_000)])).is_err());
        assert!(validate_new_sale(&sale(vec![line(1, -10)])).is_err());
        assert!(matches!(
            validate_new_sale(&sale(vec![line(3, i64::MAX / 2)])),
            Err(ValidationError::OutOfRange { .. })
        ));

        let mut blank_code = sale(vec![line(1, 10)]);
        blank_code.order_code = "  ".to_string();
        assert!(validate_new_sale(&blank_code).is_err());

        let mut bad_variant = line(1, 10);
        bad_variant.variant_id = "v-1".to_string();
        assert!(validate_new_sale(&sale(vec![bad_variant])).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid(VARIANT_ID).is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
