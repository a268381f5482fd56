//! # Line Calculator
//!
//! Computes admin fee, zakat and net profit for one sold line.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Per unit                                                               │
//! │    fee    = Σ pct% × sell  +  Σ fixed                                  │
//! │    gross  = sell − cost − fee                                          │
//! │    zakat  = 2.5% × gross   (only when gross > 0)                        │
//! │    net    = gross − zakat                                              │
//! │                                                                         │
//! │  Per line (× quantity, rounded ONCE at this point)                      │
//! │    total_fee  = round(fee × q)                                         │
//! │    zakat      = round(zakat × q)                                       │
//! │    net_profit = round(gross × q) − zakat                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-unit figures are held in ten-thousandths of a rupiah so percentage
//! fees in basis points stay exact. Rounding is half toward +∞.
//!
//! Every step is checked. Validated input (prices up to [`crate::MAX_PRICE`])
//! never overflows; anything else is rejected with
//! `ValidationError::Overflow` rather than wrapping.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{FeeKind, FeeRule};
use crate::validation::ValidationResult;
use crate::ZAKAT_RATE_BPS;

/// Fixed-point scale of per-unit figures (1 rupiah = 10 000 units).
const SCALE: i128 = 10_000;

/// Computed money figures of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineAmounts {
    /// Admin fee for the whole line.
    pub total_fee: Money,
    /// Gross profit for the whole line (sell − cost − fee, × quantity).
    pub gross_profit: Money,
    /// Zakat for the whole line.
    pub zakat: Money,
    /// Net profit for the whole line; always `gross_profit − zakat`.
    pub net_profit: Money,
}

/// Per-unit fee in scaled units.
fn unit_fee_scaled(sell_price: Money, fees: &[FeeRule]) -> Option<i128> {
    fees.iter().try_fold(0i128, |total, rule| {
        let fee = match rule.kind {
            // sell × bps / 10 000 rupiah == sell × bps scaled units
            FeeKind::Percentage => i128::from(sell_price.rupiah()).checked_mul(i128::from(rule.value))?,
            FeeKind::Fixed => i128::from(rule.value).checked_mul(SCALE)?,
        };
        total.checked_add(fee)
    })
}

/// Calculates the fee, zakat and net profit of one sale line.
///
/// ## Arguments
/// * `sell_price` - unit sell price (≥ 0)
/// * `cost_price` - unit cost price (≥ 0)
/// * `quantity` - units sold (> 0)
/// * `fees` - the marketplace's fee rules, in order
///
/// ## Returns
/// * `Err(ValidationError::Overflow)` - A line total does not fit in `i64`
///
/// ## Example
/// ```rust
/// use kasir_core::calculator::calculate_line;
/// use kasir_core::money::Money;
///
/// // Offline sale: no fees
/// let line = calculate_line(Money::from_rupiah(100), Money::from_rupiah(60), 2, &[]).unwrap();
/// assert_eq!(line.total_fee.rupiah(), 0);
/// assert_eq!(line.zakat.rupiah(), 2);      // 2.5% of 80
/// assert_eq!(line.net_profit.rupiah(), 78);
/// ```
pub fn calculate_line(
    sell_price: Money,
    cost_price: Money,
    quantity: i64,
    fees: &[FeeRule],
) -> ValidationResult<LineAmounts> {
    line_amounts(sell_price, cost_price, quantity, fees).ok_or_else(|| ValidationError::Overflow {
        field: "sell_price".to_string(),
    })
}

fn line_amounts(
    sell_price: Money,
    cost_price: Money,
    quantity: i64,
    fees: &[FeeRule],
) -> Option<LineAmounts> {
    let qty = i128::from(quantity);

    let fee_scaled = unit_fee_scaled(sell_price, fees)?;
    let margin = i128::from(sell_price.rupiah()) - i128::from(cost_price.rupiah());
    let gross_scaled = margin.checked_mul(SCALE)?.checked_sub(fee_scaled)?;
    let gross_line = gross_scaled.checked_mul(qty)?;

    let total_fee = Money::round_scaled(fee_scaled.checked_mul(qty)?, SCALE)?;
    let gross_profit = Money::round_scaled(gross_line, SCALE)?;

    let zakat = if gross_scaled > 0 {
        Money::round_scaled(
            gross_line.checked_mul(i128::from(ZAKAT_RATE_BPS))?,
            SCALE * 10_000,
        )?
    } else {
        Money::zero()
    };

    Some(LineAmounts {
        total_fee,
        gross_profit,
        zakat,
        net_profit: gross_profit.checked_sub(zakat)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
