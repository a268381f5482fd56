//! # Sale Repository
//!
//! Recording sales against variant stock, and reversing them.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD (one BEGIN IMMEDIATE transaction)                           │
//! │     └── record_sale()                                                  │
//! │         ├── upsert order by (marketplace, order_code)                  │
//! │         ├── per line: stock - q  WHERE stock >= q                      │
//! │         ├── per line: calculate_line() → insert line item              │
//! │         └── commit (or nothing at all)                                 │
//! │                                                                         │
//! │  2. (OPTIONAL) REVERSE (one transaction)                               │
//! │     ├── delete_line_item() → stock + q, drop empty order               │
//! │     ├── delete_order()     → stock + q for every line                  │
//! │     └── reset_sales()      → stock + q for every line of every order   │
//! │                                                                         │
//! │  3. ARCHIVE (rekap, see SummaryRepository)                             │
//! │     └── lines summarized then removed; stock stays sold                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write path opens its transaction with
//! [`begin_write`](crate::repository::begin_write), so concurrent sales and
//! reversals queue on SQLite's write lock instead of failing mid-way.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::fee::active_rules;
use crate::repository::product::{adjust_stock, restore_stock, variant_snapshot};
use crate::repository::{begin_write, generate_id, now};
use kasir_core::validation::validate_new_sale;
use kasir_core::{calculate_line, LineItem, Money, NewSale, Order, OrderDetail, ValidationError};

/// What a reversal put back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReversalOutcome {
    pub order_id: String,
    pub lines_removed: u64,
    /// Units returned to variant stock (lines of deleted variants excluded).
    pub units_restored: i64,
    /// Whether the order itself is gone.
    pub order_removed: bool,
}

/// Which orders to list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleFilter {
    pub date: NaiveDate,
    /// Case-insensitive part of an order code ("Cari Kode").
    #[serde(default)]
    pub search: Option<String>,
}

impl SaleFilter {
    /// Every order of `date`.
    pub fn on(date: NaiveDate) -> Self {
        SaleFilter { date, search: None }
    }
}

/// Distinct orders of one marketplace on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MarketplaceOrderCount {
    pub marketplace: String,
    pub orders: i64,
    pub units: i64,
}

/// What a bulk reset removed and put back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    /// `None` when every date was reset.
    pub date: Option<NaiveDate>,
    pub orders_removed: u64,
    pub lines_removed: u64,
    pub units_restored: i64,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records the lines of a sale under an order code, all or nothing.
    ///
    /// The order is created on first use of its code within the marketplace
    /// and reused afterwards. Each line decrements its variant's stock
    /// atomically; if any line lacks stock the whole call rolls back and
    /// nothing is persisted.
    ///
    /// ## Transaction
    /// One `BEGIN IMMEDIATE` transaction: order upsert, fee lookup, then per
    /// line a conditional stock decrement, snapshot and insert. Two sales of
    /// the same variant are serialized on the write lock, so the second one
    /// sees the stock the first one left and can never oversell.
    ///
    /// ## Returns
    /// The order with the line items inserted by this call.
    ///
    /// ## Errors
    /// * `DbError::Domain(Validation)` - Bad request, nothing touched. Also
    ///   raised when the code is already used by the same marketplace on
    ///   another date, or a line total overflows.
    /// * `DbError::Domain(InsufficientStock)` - A line exceeds current stock
    /// * `DbError::NotFound` - A variant doesn't exist
    pub async fn record_sale(&self, sale: &NewSale) -> DbResult<OrderDetail> {
        validate_new_sale(sale)?;

        let order_code = sale.order_code.trim();
        let marketplace = sale.marketplace.trim();

        debug!(
            order_code = %order_code,
            marketplace = %marketplace,
            date = %sale.date,
            lines = sale.lines.len(),
            "Recording sale"
        );

        let mut tx = begin_write(&self.pool).await?;

        let order = upsert_order(&mut tx, order_code, marketplace, sale.date).await?;
        let fees = active_rules(&mut tx, marketplace).await?;

        let mut items = Vec::with_capacity(sale.lines.len());
        for line in &sale.lines {
            adjust_stock(&mut tx, &line.variant_id, -line.quantity).await?;
            let snapshot = variant_snapshot(&mut tx, &line.variant_id).await?;

            let amounts = calculate_line(
                Money::from_rupiah(line.sell_price),
                Money::from_rupiah(line.cost_price),
                line.quantity,
                &fees,
            )?;

            let item = LineItem {
                id: generate_id(),
                order_id: order.id.clone(),
                variant_id: line.variant_id.clone(),
                product_code: snapshot.product_code,
                product_name: snapshot.product_name,
                color: snapshot.color,
                quantity: line.quantity,
                sell_price: line.sell_price,
                cost_price: line.cost_price,
                total_fee: amounts.total_fee.rupiah(),
                zakat: amounts.zakat.rupiah(),
                net_profit: amounts.net_profit.rupiah(),
                created_at: now(),
            };

            insert_line_item(&mut tx, &item).await?;
            items.push(item);
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_code = %order.order_code,
            lines = items.len(),
            "Sale recorded"
        );

        Ok(OrderDetail { order, items })
    }

    /// Gets an order with all its line items.
    ///
    /// ## Arguments
    /// * `id` - Order UUID
    ///
    /// ## Returns
    /// * `Ok(OrderDetail)` - Order and its lines, oldest line first
    /// * `Err(DbError::NotFound)` - No order with that id
    pub async fn get_order(&self, id: &str) -> DbResult<OrderDetail> {
        let order: Option<Order> = sqlx::query_as(
            "SELECT id, order_code, marketplace, date, created_at FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let order = order.ok_or_else(|| DbError::not_found("Order", id))?;

        let mut conn = self.pool.acquire().await?;
        let items = lines_of_order(&mut conn, id).await?;

        Ok(OrderDetail { order, items })
    }

    /// Orders dated `date` with their line items, oldest first.
    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<OrderDetail>> {
        self.list(&SaleFilter::on(date)).await
    }

    /// Orders matching `filter`, with their line items, oldest first.
    ///
    /// A blank search matches every order of the date.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<OrderDetail>> {
        let date = filter.date;
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let orders: Vec<Order> = sqlx::query_as(
            r#"
            SELECT id, order_code, marketplace, date, created_at
            FROM orders
            WHERE date = ?1
              AND (?2 IS NULL OR instr(lower(order_code), lower(?2)) > 0)
            ORDER BY created_at, rowid
            "#,
        )
        .bind(date)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        let items: Vec<LineItem> = sqlx::query_as(
            r#"
            SELECT li.id, li.order_id, li.variant_id, li.product_code, li.product_name,
                   li.color, li.quantity, li.sell_price, li.cost_price,
                   li.total_fee, li.zakat, li.net_profit, li.created_at
            FROM line_items li
            INNER JOIN orders o ON o.id = li.order_id
            WHERE o.date = ?1
              AND (?2 IS NULL OR instr(lower(o.order_code), lower(?2)) > 0)
            ORDER BY li.created_at, li.rowid
            "#,
        )
        .bind(date)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<String, Vec<LineItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id.clone()).or_default().push(item);
        }

        debug!(date = %date, ?search, orders = orders.len(), "Listed orders");

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetail { order, items }
            })
            .collect())
    }

    /// Distinct orders and units sold per marketplace on `date` ("terjual").
    ///
    /// Ordered by marketplace name; marketplaces without orders are absent.
    pub async fn order_counts(&self, date: NaiveDate) -> DbResult<Vec<MarketplaceOrderCount>> {
        let counts: Vec<MarketplaceOrderCount> = sqlx::query_as(
            r#"
            SELECT o.marketplace,
                   COUNT(DISTINCT o.order_code) AS orders,
                   COALESCE(SUM(li.quantity), 0) AS units
            FROM orders o
            LEFT JOIN line_items li ON li.order_id = o.id
            WHERE o.date = ?1
            GROUP BY o.marketplace
            ORDER BY o.marketplace
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Deletes one line item and puts its quantity back on the variant.
    ///
    /// The order is deleted too when this was its last line.
    ///
    /// ## Transaction
    /// Opened with `BEGIN IMMEDIATE`: the line read, the stock restore and
    /// both deletes commit together or not at all.
    ///
    /// ## Returns
    /// * `Ok(ReversalOutcome)` - `order_removed` is set when the order went too
    /// * `Err(DbError::NotFound)` - No line item with that id
    pub async fn delete_line_item(&self, id: &str) -> DbResult<ReversalOutcome> {
        debug!(id = %id, "Reversing line item");

        let mut tx = begin_write(&self.pool).await?;

        let item: Option<LineItem> = sqlx::query_as(
            r#"
            SELECT id, order_id, variant_id, product_code, product_name, color,
                   quantity, sell_price, cost_price, total_fee, zakat, net_profit, created_at
            FROM line_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let item = item.ok_or_else(|| DbError::not_found("LineItem", id))?;

        let units_restored = restore_line(&mut tx, &item).await?;

        sqlx::query("DELETE FROM line_items WHERE id = ?1")
            .bind(&item.id)
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM orders
            WHERE id = ?1
              AND NOT EXISTS (SELECT 1 FROM line_items WHERE order_id = ?1)
            "#,
        )
        .bind(&item.order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let outcome = ReversalOutcome {
            order_id: item.order_id,
            lines_removed: 1,
            units_restored,
            order_removed: removed.rows_affected() > 0,
        };

        info!(
            id = %id,
            order_id = %outcome.order_id,
            units_restored = outcome.units_restored,
            order_removed = outcome.order_removed,
            "Line item reversed"
        );

        Ok(outcome)
    }

    /// Deletes an order, restoring stock for every one of its lines.
    ///
    /// A variant deleted since the sale is skipped with a warning; the line
    /// is removed anyway.
    ///
    /// ## Transaction
    /// One `BEGIN IMMEDIATE` transaction for the restores and the delete.
    ///
    /// ## Returns
    /// * `Ok(ReversalOutcome)` - Lines removed and units put back
    /// * `Err(DbError::NotFound)` - No order with that id
    pub async fn delete_order(&self, id: &str) -> DbResult<ReversalOutcome> {
        debug!(id = %id, "Reversing order");

        let mut tx = begin_write(&self.pool).await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Err(DbError::not_found("Order", id));
        }

        let items = lines_of_order(&mut tx, id).await?;

        let mut units_restored = 0;
        for item in &items {
            units_restored += restore_line(&mut tx, item).await?;
        }

        // line_items go with the order (ON DELETE CASCADE)
        sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            id = %id,
            lines = items.len(),
            units_restored = units_restored,
            "Order reversed"
        );

        Ok(ReversalOutcome {
            order_id: id.to_string(),
            lines_removed: items.len() as u64,
            units_restored,
            order_removed: true,
        })
    }

    /// Deletes every order (of `date`, or of all dates) and puts every sold
    /// unit back on its variant, in one transaction.
    ///
    /// Summaries and archived totals are left alone; only unarchived sales
    /// are reset.
    pub async fn reset_sales(&self, date: Option<NaiveDate>) -> DbResult<ResetOutcome> {
        debug!(?date, "Resetting sales");

        let mut tx = begin_write(&self.pool).await?;

        let items: Vec<LineItem> = sqlx::query_as(
            r#"
            SELECT li.id, li.order_id, li.variant_id, li.product_code, li.product_name,
                   li.color, li.quantity, li.sell_price, li.cost_price,
                   li.total_fee, li.zakat, li.net_profit, li.created_at
            FROM line_items li
            INNER JOIN orders o ON o.id = li.order_id
            WHERE ?1 IS NULL OR o.date = ?1
            "#,
        )
        .bind(date)
        .fetch_all(&mut *tx)
        .await?;

        let mut units_restored = 0;
        for item in &items {
            units_restored += restore_line(&mut tx, item).await?;
        }

        // line_items go with their orders (ON DELETE CASCADE)
        let orders = sqlx::query("DELETE FROM orders WHERE ?1 IS NULL OR date = ?1")
            .bind(date)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let outcome = ResetOutcome {
            date,
            orders_removed: orders.rows_affected(),
            lines_removed: items.len() as u64,
            units_restored,
        };

        info!(
            ?date,
            orders = outcome.orders_removed,
            lines = outcome.lines_removed,
            units_restored = outcome.units_restored,
            "Sales reset"
        );

        Ok(outcome)
    }
}

/// Finds the marketplace's order with this code, or creates it.
///
/// An existing order must be of the same date.
async fn upsert_order(
    conn: &mut SqliteConnection,
    order_code: &str,
    marketplace: &str,
    date: NaiveDate,
) -> DbResult<Order> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, order_code, marketplace, date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (marketplace, order_code) DO NOTHING
        "#,
    )
    .bind(generate_id())
    .bind(order_code)
    .bind(marketplace)
    .bind(date)
    .bind(now())
    .execute(&mut *conn)
    .await?;

    let order: Order = sqlx::query_as(
        r#"
        SELECT id, order_code, marketplace, date, created_at
        FROM orders
        WHERE marketplace = ?1 AND order_code = ?2
        "#,
    )
    .bind(marketplace)
    .bind(order_code)
    .fetch_one(&mut *conn)
    .await?;

    if order.date != date {
        return Err(ValidationError::InvalidFormat {
            field: "order_code".to_string(),
            reason: format!(
                "'{}' is already recorded for {} on {}",
                order_code, order.marketplace, order.date
            ),
        }
        .into());
    }

    Ok(order)
}

async fn insert_line_item(conn: &mut SqliteConnection, item: &LineItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO line_items (
            id, order_id, variant_id, product_code, product_name, color,
            quantity, sell_price, cost_price, total_fee, zakat, net_profit,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.variant_id)
    .bind(&item.product_code)
    .bind(&item.product_name)
    .bind(&item.color)
    .bind(item.quantity)
    .bind(item.sell_price)
    .bind(item.cost_price)
    .bind(item.total_fee)
    .bind(item.zakat)
    .bind(item.net_profit)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn lines_of_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<LineItem>> {
    let items: Vec<LineItem> = sqlx::query_as(
        r#"
        SELECT id, order_id, variant_id, product_code, product_name, color,
               quantity, sell_price, cost_price, total_fee, zakat, net_profit, created_at
        FROM line_items
        WHERE order_id = ?1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Puts a line's quantity back; returns the units restored.
async fn restore_line(conn: &mut SqliteConnection, item: &LineItem) -> DbResult<i64> {
    if restore_stock(conn, &item.variant_id, item.quantity).await? {
        Ok(item.quantity)
    } else {
        warn!(
            line_item_id = %item.id,
            variant_id = %item.variant_id,
            quantity = item.quantity,
            "Variant no longer exists, stock not restored"
        );
        Ok(0)
    }
}
