//! # Summary Repository
//!
//! Daily per-marketplace rollups ("rekap") and their history.
//!
//! ## Rekap Harian
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  archive_date(2026-03-02)            ONE BEGIN IMMEDIATE transaction    │
//! │                                                                         │
//! │  archived_totals (2026-03-02)  +  line_items ⋈ orders (2026-03-02)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kasir_core::rollup::summarize_onto()  →  upsert daily_summaries       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  archived_totals := the new summary totals                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DELETE line_items, orders of that date   (stock is NOT restored)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ─── any failure before this point leaves everything as it was  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A summary is always `archived totals + live lines` of its marketplace and
//! date, written over the previous row. Rerunning summarize or archive cannot
//! double count, and sales recorded on a date after it was archived are
//! added to what the archive already holds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, generate_id, now};
use kasir_core::rollup::{summarize_onto, ArchivedTotals, DailyTotals, SoldLine};
use kasir_core::{DailySummary, ValidationError};

/// Filter for the summary history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryFilter {
    /// Month 1-12.
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub marketplace: Option<String>,
    /// 1-based page; 0 is read as 1.
    #[serde(default)]
    pub page: u32,
}

/// Grand totals over every summary matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SummaryTotals {
    pub total_units: i64,
    pub total_sell: i64,
    pub total_cost: i64,
    pub total_fee: i64,
    pub total_zakat: i64,
    pub total_net_profit: i64,
}

/// One page of summary history.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryPage {
    pub items: Vec<DailySummary>,
    pub page: u32,
    pub page_size: u32,
    /// Number of summaries matching the filter.
    pub total: i64,
    pub total_pages: u32,
    pub totals: SummaryTotals,
}

/// Result of a rekap.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub date: NaiveDate,
    pub summaries: Vec<DailySummary>,
    pub orders_archived: u64,
    pub lines_archived: u64,
}

#[derive(sqlx::FromRow)]
struct FilteredAggregate {
    count: i64,
    #[sqlx(flatten)]
    totals: SummaryTotals,
}

/// Repository for daily summary operations.
#[derive(Debug, Clone)]
pub struct SummaryRepository {
    pool: SqlitePool,
}

impl SummaryRepository {
    /// Creates a new SummaryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SummaryRepository { pool }
    }

    /// Summarizes `date` into one row per marketplace, overwriting any
    /// previous summary of the same marketplace and date.
    ///
    /// Source lines are left in place. Each row is the date's archived
    /// totals plus its live lines; a date with neither writes nothing.
    ///
    /// ## Errors
    /// * `DbError::Domain(Validation(Overflow))` - A total does not fit in `i64`
    pub async fn summarize_date(&self, date: NaiveDate) -> DbResult<Vec<DailySummary>> {
        debug!(date = %date, "Summarizing date");

        let mut tx = begin_write(&self.pool).await?;
        let totals = write_summaries(&mut tx, date).await?;
        tx.commit().await?;

        let summaries: Vec<DailySummary> = totals.into_iter().map(|(summary, _)| summary).collect();

        info!(date = %date, marketplaces = summaries.len(), "Date summarized");
        Ok(summaries)
    }

    /// Rekap harian: summarizes `date`, keeps its totals as archived totals
    /// and removes its orders and line items, all in one transaction.
    ///
    /// Stock is not restored; the goods were sold. Sales recorded on the
    /// same date afterwards are added on top at the next summarize or
    /// archive. Archiving a date twice changes nothing.
    pub async fn archive_date(&self, date: NaiveDate) -> DbResult<ArchiveOutcome> {
        debug!(date = %date, "Archiving date");

        let mut tx = begin_write(&self.pool).await?;

        let written = write_summaries(&mut tx, date).await?;

        let mut summaries = Vec::with_capacity(written.len());
        for (summary, totals) in written {
            store_archived(&mut tx, date, &totals.to_archived()).await?;
            summaries.push(summary);
        }

        let lines = sqlx::query(
            r#"
            DELETE FROM line_items
            WHERE order_id IN (SELECT id FROM orders WHERE date = ?1)
            "#,
        )
        .bind(date)
        .execute(&mut *tx)
        .await?;

        let orders = sqlx::query("DELETE FROM orders WHERE date = ?1")
            .bind(date)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let outcome = ArchiveOutcome {
            date,
            summaries,
            orders_archived: orders.rows_affected(),
            lines_archived: lines.rows_affected(),
        };

        info!(
            date = %date,
            marketplaces = outcome.summaries.len(),
            orders = outcome.orders_archived,
            lines = outcome.lines_archived,
            "Date archived"
        );

        Ok(outcome)
    }

    /// Summary history, newest date first, one page at a time.
    ///
    /// ## Arguments
    /// * `filter` - Optional month, year and marketplace, plus the page
    /// * `page_size` - Rows per page
    ///
    /// ## Returns
    /// * `Ok(SummaryPage)` - The page plus grand totals over every matching
    ///   row, not only the ones on the page
    pub async fn list(&self, filter: &SummaryFilter, page_size: u32) -> DbResult<SummaryPage> {
        if let Some(month) = filter.month {
            if !(1..=12).contains(&month) {
                return Err(ValidationError::OutOfRange {
                    field: "month".to_string(),
                    min: 1,
                    max: 12,
                }
                .into());
            }
        }
        if page_size == 0 {
            return Err(ValidationError::MustBePositive {
                field: "page_size".to_string(),
            }
            .into());
        }

        let page = filter.page.max(1);
        let year = filter.year.map(|y| format!("{:04}", y));
        let month = filter.month.map(|m| format!("{:02}", m));
        let marketplace = filter
            .marketplace
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        debug!(?year, ?month, ?marketplace, page = page, "Listing summaries");

        let aggregate: FilteredAggregate = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS count,
                COALESCE(SUM(total_units), 0) AS total_units,
                COALESCE(SUM(total_sell), 0) AS total_sell,
                COALESCE(SUM(total_cost), 0) AS total_cost,
                COALESCE(SUM(total_fee), 0) AS total_fee,
                COALESCE(SUM(total_zakat), 0) AS total_zakat,
                COALESCE(SUM(total_net_profit), 0) AS total_net_profit
            FROM daily_summaries
            WHERE (?1 IS NULL OR strftime('%Y', date) = ?1)
              AND (?2 IS NULL OR strftime('%m', date) = ?2)
              AND (?3 IS NULL OR marketplace = ?3)
            "#,
        )
        .bind(year.as_deref())
        .bind(month.as_deref())
        .bind(marketplace)
        .fetch_one(&self.pool)
        .await?;

        let offset = i64::from(page - 1) * i64::from(page_size);

        let items: Vec<DailySummary> = sqlx::query_as(
            r#"
            SELECT id, marketplace, date, day_name, total_units, total_sell, total_cost,
                   total_fee, total_zakat, total_net_profit, created_at, updated_at
            FROM daily_summaries
            WHERE (?1 IS NULL OR strftime('%Y', date) = ?1)
              AND (?2 IS NULL OR strftime('%m', date) = ?2)
              AND (?3 IS NULL OR marketplace = ?3)
            ORDER BY date DESC, marketplace
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(year.as_deref())
        .bind(month.as_deref())
        .bind(marketplace)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_pages = (aggregate.count as u64).div_ceil(u64::from(page_size)) as u32;

        Ok(SummaryPage {
            items,
            page,
            page_size,
            total: aggregate.count,
            total_pages,
            totals: aggregate.totals,
        })
    }

    /// Deletes one summary row, with the archived totals behind it.
    ///
    /// A later summarize of the same marketplace and date starts from zero.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let deleted: Option<(String, NaiveDate)> =
            sqlx::query_as("DELETE FROM daily_summaries WHERE id = ?1 RETURNING marketplace, date")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((marketplace, date)) = deleted else {
            return Err(DbError::not_found("DailySummary", id));
        };

        sqlx::query("DELETE FROM archived_totals WHERE marketplace = ?1 AND date = ?2")
            .bind(&marketplace)
            .bind(date)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, marketplace = %marketplace, date = %date, "Summary deleted");
        Ok(())
    }
}

/// Folds the live lines of `date` onto its archived totals and upserts one
/// summary per marketplace.
async fn write_summaries(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> DbResult<Vec<(DailySummary, DailyTotals)>> {
    let archived: Vec<ArchivedTotals> = sqlx::query_as(
        r#"
        SELECT marketplace, total_units, total_sell, total_cost,
               total_fee, total_zakat, total_net_profit
        FROM archived_totals
        WHERE date = ?1
        "#,
    )
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    let lines: Vec<SoldLine> = sqlx::query_as(
        r#"
        SELECT o.marketplace, li.quantity, li.sell_price, li.cost_price,
               li.total_fee, li.zakat, li.net_profit
        FROM line_items li
        INNER JOIN orders o ON o.id = li.order_id
        WHERE o.date = ?1
        "#,
    )
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    debug!(date = %date, archived = archived.len(), lines = lines.len(), "Folding day");

    let totals = summarize_onto(date, &archived, &lines)?;

    let mut written = Vec::with_capacity(totals.len());
    for group in totals {
        let summary = upsert_summary(conn, &group).await?;
        written.push((summary, group));
    }

    Ok(written)
}

/// Replaces the archived totals of one marketplace and date.
async fn store_archived(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    totals: &ArchivedTotals,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO archived_totals (
            marketplace, date,
            total_units, total_sell, total_cost, total_fee, total_zakat, total_net_profit,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT (marketplace, date) DO UPDATE SET
            total_units = excluded.total_units,
            total_sell = excluded.total_sell,
            total_cost = excluded.total_cost,
            total_fee = excluded.total_fee,
            total_zakat = excluded.total_zakat,
            total_net_profit = excluded.total_net_profit,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&totals.marketplace)
    .bind(date)
    .bind(totals.total_units)
    .bind(totals.total_sell)
    .bind(totals.total_cost)
    .bind(totals.total_fee)
    .bind(totals.total_zakat)
    .bind(totals.total_net_profit)
    .bind(now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn upsert_summary(conn: &mut SqliteConnection, totals: &DailyTotals) -> DbResult<DailySummary> {
    let now = now();

    let summary: DailySummary = sqlx::query_as(
        r#"
        INSERT INTO daily_summaries (
            id, marketplace, date, day_name,
            total_units, total_sell, total_cost, total_fee, total_zakat, total_net_profit,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
        ON CONFLICT (marketplace, date) DO UPDATE SET
            day_name = excluded.day_name,
            total_units = excluded.total_units,
            total_sell = excluded.total_sell,
            total_cost = excluded.total_cost,
            total_fee = excluded.total_fee,
            total_zakat = excluded.total_zakat,
            total_net_profit = excluded.total_net_profit,
            updated_at = excluded.updated_at
        RETURNING id, marketplace, date, day_name, total_units, total_sell, total_cost,
                  total_fee, total_zakat, total_net_profit, created_at, updated_at
        "#,
    )
    .bind(generate_id())
    .bind(&totals.marketplace)
    .bind(totals.date)
    .bind(totals.day_name)
    .bind(totals.total_units)
    .bind(totals.total_sell.rupiah())
    .bind(totals.total_cost.rupiah())
    .bind(totals.total_fee.rupiah())
    .bind(totals.total_zakat.rupiah())
    .bind(totals.total_net_profit.rupiah())
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(summary)
}
