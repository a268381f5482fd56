//! Rupiah amounts and marketplace fee rates.
//!
//! Money is a whole number of rupiah; fee percentages are basis points.
//! `0.0825` has no exact `f64` form, while `50000 * 825 / 10000` is exactly
//! `4125`. Sub-rupiah fractions that appear
//! mid-calculation are carried as scaled integers and rounded once, with
//! [`Money::round_scaled`].
//!
//! Multiplication and rounding are checked and return `None` when the result
//! leaves `i64`; callers turn that into `ValidationError::Overflow`.
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::Money;
//!
//! let price = Money::from_rupiah(50_000);
//! let total = price.checked_multiply_quantity(4).unwrap();
//! assert_eq!(total.rupiah(), 200_000);
//! assert_eq!(total.to_string(), "Rp 200.000");
//!
//! assert!(Money::from_rupiah(i64::MAX).checked_multiply_quantity(2).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// A monetary value in whole rupiah.
///
/// Rupiah has no minor unit in day-to-day trade, so the smallest currency
/// unit is the rupiah itself.
///
/// ## Where Money Flows
/// ```text
/// Product.sell_price ──► SaleLine.sell_price ──► calculate_line()
///                                                   │
///                      LineItem.total_fee / zakat / net_profit
///                                                   │
///                                   DailySummary totals (rollup)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupiah.
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah)
    }

    /// Rounds a scaled amount (`numerator / denominator` rupiah) to the
    /// nearest rupiah, halves toward positive infinity.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// assert_eq!(Money::round_scaled(15_875, 10).unwrap().rupiah(), 1_588);  // 1587.5
    /// assert_eq!(Money::round_scaled(-25, 10).unwrap().rupiah(), -2);        // -2.5
    /// assert_eq!(Money::round_scaled(-26, 10).unwrap().rupiah(), -3);        // -2.6
    /// ```
    ///
    /// ## Returns
    /// * `None` - `denominator` is not positive, or the rounded value does
    ///   not fit in `i64`
    pub fn round_scaled(numerator: i128, denominator: i128) -> Option<Self> {
        if denominator <= 0 {
            return None;
        }

        // floor(n/d + 1/2) == floor((2n + d) / 2d)
        let rounded = numerator
            .checked_mul(2)?
            .checked_add(denominator)?
            .div_euclid(denominator.checked_mul(2)?);

        i64::try_from(rounded).ok().map(Money)
    }

    /// Returns the value in rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line total for `qty` units at this unit price, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(total) => Some(Money(total)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Money(sum)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(diff) => Some(Money(diff)),
            None => None,
        }
    }
}

/// Formats as Indonesian rupiah with dot thousands separators: `Rp 1.250.000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}Rp {}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Fee Rate
// =============================================================================

/// A percentage rate in basis points (bps).
///
/// 1 basis point = 0.01%, so 825 bps = 8.25% (a typical marketplace admin fee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeRate(u32);

impl FeeRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        FeeRate(bps)
    }

    /// Creates a rate from a percentage as typed into a form (8.25 → 825 bps).
    pub fn from_percentage(pct: f64) -> Self {
        FeeRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
