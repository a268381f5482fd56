//! # Daily Rollup
//!
//! Groups one business day's sold lines into one total per marketplace.
//!
//! ```text
//! 2026-03-02 lines                          DailyTotals
//! ─────────────────────────────             ─────────────────────────────
//! Shopee    qty 2  sell 100  cost 60  ──┐
//! Shopee    qty 3  sell 100  cost 60  ──┴─► Shopee     units 5  sell 500
//! Tokopedia qty 1  sell 250  cost 90  ────► Tokopedia  units 1  sell 250
//! ```
//!
//! Once a day has been archived its lines are gone, so later sales on the
//! same date are added on top of the [`ArchivedTotals`] kept for it:
//!
//! ```text
//! archived  Shopee units 5 ──┐
//! live line Shopee qty 1   ──┴─► Shopee units 6
//! ```
//!
//! The persistence side (reading the lines, upserting summaries, deleting
//! archived rows) lives in `kasir-db`; this module only does the arithmetic.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

/// The figures of one sold line that the rollup needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SoldLine {
    pub marketplace: String,
    pub quantity: i64,
    /// Unit sell price.
    pub sell_price: i64,
    /// Unit cost price.
    pub cost_price: i64,
    pub total_fee: i64,
    pub zakat: i64,
    pub net_profit: i64,
}

/// Totals already folded out of deleted lines of one marketplace and day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ArchivedTotals {
    pub marketplace: String,
    pub total_units: i64,
    pub total_sell: i64,
    pub total_cost: i64,
    pub total_fee: i64,
    pub total_zakat: i64,
    pub total_net_profit: i64,
}

/// Totals of one marketplace on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub marketplace: String,
    pub date: NaiveDate,
    pub day_name: &'static str,
    pub total_units: i64,
    pub total_sell: Money,
    pub total_cost: Money,
    pub total_fee: Money,
    pub total_zakat: Money,
    pub total_net_profit: Money,
}

impl DailyTotals {
    fn empty(marketplace: &str, date: NaiveDate) -> Self {
        DailyTotals {
            marketplace: marketplace.to_string(),
            date,
            day_name: day_name(date),
            total_units: 0,
            total_sell: Money::zero(),
            total_cost: Money::zero(),
            total_fee: Money::zero(),
            total_zakat: Money::zero(),
            total_net_profit: Money::zero(),
        }
    }

    fn add(&mut self, line: &SoldLine) -> Option<()> {
        let sell = Money::from_rupiah(line.sell_price).checked_multiply_quantity(line.quantity)?;
        let cost = Money::from_rupiah(line.cost_price).checked_multiply_quantity(line.quantity)?;

        self.add_amounts(
            line.quantity,
            [
                sell,
                cost,
                Money::from_rupiah(line.total_fee),
                Money::from_rupiah(line.zakat),
                Money::from_rupiah(line.net_profit),
            ],
        )
    }

    fn add_archived(&mut self, archived: &ArchivedTotals) -> Option<()> {
        self.add_amounts(
            archived.total_units,
            [
                Money::from_rupiah(archived.total_sell),
                Money::from_rupiah(archived.total_cost),
                Money::from_rupiah(archived.total_fee),
                Money::from_rupiah(archived.total_zakat),
                Money::from_rupiah(archived.total_net_profit),
            ],
        )
    }

    /// Adds units and `[sell, cost, fee, zakat, net]`; `None` on overflow,
    /// leaving `self` unchanged.
    fn add_amounts(&mut self, units: i64, [sell, cost, fee, zakat, net]: [Money; 5]) -> Option<()> {
        let next = DailyTotals {
            total_units: self.total_units.checked_add(units)?,
            total_sell: self.total_sell.checked_add(sell)?,
            total_cost: self.total_cost.checked_add(cost)?,
            total_fee: self.total_fee.checked_add(fee)?,
            total_zakat: self.total_zakat.checked_add(zakat)?,
            total_net_profit: self.total_net_profit.checked_add(net)?,
            ..self.clone()
        };
        *self = next;
        Some(())
    }

    /// The figures to keep once this day's lines are deleted.
    pub fn to_archived(&self) -> ArchivedTotals {
        ArchivedTotals {
            marketplace: self.marketplace.clone(),
            total_units: self.total_units,
            total_sell: self.total_sell.rupiah(),
            total_cost: self.total_cost.rupiah(),
            total_fee: self.total_fee.rupiah(),
            total_zakat: self.total_zakat.rupiah(),
            total_net_profit: self.total_net_profit.rupiah(),
        }
    }
}

/// Groups `lines` (all of `date`) by marketplace and sums them.
///
/// Output is ordered by marketplace name. No lines → empty vector.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use kasir_core::rollup::{summarize, SoldLine};
///
/// let line = |qty| SoldLine {
///     marketplace: "Shopee".to_string(),
///     quantity: qty,
///     sell_price: 100,
///     cost_price: 60,
///     total_fee: 0,
///     zakat: 0,
///     net_profit: 0,
/// };
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let totals = summarize(date, &[line(2), line(3)]).unwrap();
///
/// assert_eq!(totals.len(), 1);
/// assert_eq!(totals[0].total_units, 5);
/// assert_eq!(totals[0].total_sell.rupiah(), 500);
/// assert_eq!(totals[0].total_cost.rupiah(), 300);
/// ```
pub fn summarize(date: NaiveDate, lines: &[SoldLine]) -> ValidationResult<Vec<DailyTotals>> {
    summarize_onto(date, &[], lines)
}

/// Like [`summarize`], starting each marketplace from its archived totals.
///
/// A marketplace with archived totals and no new lines still gets a row.
///
/// ## Returns
/// * `Err(ValidationError::Overflow)` - A total does not fit in `i64`
pub fn summarize_onto(
    date: NaiveDate,
    archived: &[ArchivedTotals],
    lines: &[SoldLine],
) -> ValidationResult<Vec<DailyTotals>> {
    let mut groups: BTreeMap<&str, DailyTotals> = BTreeMap::new();

    for base in archived {
        groups
            .entry(base.marketplace.as_str())
            .or_insert_with(|| DailyTotals::empty(&base.marketplace, date))
            .add_archived(base)
            .ok_or_else(|| overflow(&base.marketplace))?;
    }

    for line in lines {
        groups
            .entry(line.marketplace.as_str())
            .or_insert_with(|| DailyTotals::empty(&line.marketplace, date))
            .add(line)
            .ok_or_else(|| overflow(&line.marketplace))?;
    }

    Ok(groups.into_values().collect())
}

fn overflow(marketplace: &str) -> ValidationError {
    ValidationError::Overflow {
        field: format!("totals of {}", marketplace),
    }
}

/// Indonesian weekday name of `date`.
pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
