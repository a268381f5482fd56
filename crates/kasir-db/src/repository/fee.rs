//! # Fee Repository
//!
//! Marketplaces and their admin fee rules.
//!
//! ```text
//! admin_fees
//! ┌───────────┬────────────────┬────────────┬───────┬───────────┐
//! │marketplace│ label          │ kind       │ value │ is_active │
//! ├───────────┼────────────────┼────────────┼───────┼───────────┤
//! │ Shopee    │ Biaya Admin    │ percentage │  825  │ 1         │  8.25%
//! │ Shopee    │ Biaya Proses   │ fixed      │ 1250  │ 1         │  Rp 1.250
//! │ Tokopedia │ Biaya Layanan  │ percentage │  650  │ 0         │  (ignored)
//! └───────────┴────────────────┴────────────┴───────┴───────────┘
//!
//! get_fees("Shopee") → [Percentage 825, Fixed 1250]
//! get_fees("Offline") → []   (no fees configured → no fee)
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, now};
use kasir_core::validation::{fee_rule_from_input, validate_fee_label, validate_marketplace_name};
use kasir_core::{AdminFee, FeeKind, FeeRule, Marketplace, NewAdminFee};

/// Repository for marketplace and admin fee operations.
#[derive(Debug, Clone)]
pub struct FeeRepository {
    pool: SqlitePool,
}

impl FeeRepository {
    /// Creates a new FeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FeeRepository { pool }
    }

    // =========================================================================
    // Fee policy
    // =========================================================================

    /// Active fee rules of a marketplace, in the order they were added.
    ///
    /// Empty when nothing is configured.
    ///
    /// ## Arguments
    /// * `marketplace` - Exact marketplace name, e.g. "Shopee"
    ///
    /// ## Returns
    /// * `Ok(Vec<FeeRule>)` - Rules `calculate_line` applies, inactive fees left out
    pub async fn get_fees(&self, marketplace: &str) -> DbResult<Vec<FeeRule>> {
        let mut conn = self.pool.acquire().await?;
        active_rules(&mut conn, marketplace).await
    }

    /// Lists admin fees, optionally for one marketplace.
    pub async fn list(&self, marketplace: Option<&str>) -> DbResult<Vec<AdminFee>> {
        let fees: Vec<AdminFee> = sqlx::query_as(
            r#"
            SELECT id, marketplace, label, kind, value, is_active, created_at, updated_at
            FROM admin_fees
            WHERE (?1 IS NULL OR marketplace = ?1)
            ORDER BY marketplace, created_at, rowid
            "#,
        )
        .bind(marketplace)
        .fetch_all(&self.pool)
        .await?;

        Ok(fees)
    }

    /// Adds an active admin fee.
    ///
    /// The value is converted from form input: percent for percentage fees,
    /// rupiah for fixed fees.
    ///
    /// ## Returns
    /// * `Ok(AdminFee)` - Stored fee, active
    /// * `Err(DbError::Domain(Validation(_)))` - Percentage outside 0-100, or a
    ///   fixed value that is negative or above `MAX_PRICE`
    pub async fn create(&self, input: &NewAdminFee) -> DbResult<AdminFee> {
        validate_marketplace_name(&input.marketplace)?;
        validate_fee_label(&input.label)?;
        let rule = fee_rule_from_input(input.kind, input.value)?;

        let now = now();
        let fee = AdminFee {
            id: generate_id(),
            marketplace: input.marketplace.trim().to_string(),
            label: input.label.trim().to_string(),
            kind: rule.kind,
            value: rule.value,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(marketplace = %fee.marketplace, label = %fee.label, "Creating admin fee");

        sqlx::query(
            r#"
            INSERT INTO admin_fees (
                id, marketplace, label, kind, value, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&fee.id)
        .bind(&fee.marketplace)
        .bind(&fee.label)
        .bind(fee.kind)
        .bind(fee.value)
        .bind(fee.is_active)
        .bind(fee.created_at)
        .bind(fee.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %fee.id, marketplace = %fee.marketplace, kind = ?fee.kind, value = fee.value, "Admin fee created");
        Ok(fee)
    }

    /// Turns a fee on or off without deleting it.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No fee with that id
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<AdminFee> {
        debug!(id = %id, is_active = is_active, "Setting admin fee state");

        let fee: Option<AdminFee> = sqlx::query_as(
            r#"
            UPDATE admin_fees
            SET is_active = ?2, updated_at = ?3
            WHERE id = ?1
            RETURNING id, marketplace, label, kind, value, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_active)
        .bind(now())
        .fetch_optional(&self.pool)
        .await?;

        fee.ok_or_else(|| DbError::not_found("AdminFee", id))
    }

    /// Deletes an admin fee.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM admin_fees WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("AdminFee", id));
        }

        info!(id = %id, "Admin fee deleted");
        Ok(())
    }

    // =========================================================================
    // Marketplaces
    // =========================================================================

    /// Lists marketplaces by name.
    pub async fn list_marketplaces(&self) -> DbResult<Vec<Marketplace>> {
        let marketplaces: Vec<Marketplace> =
            sqlx::query_as("SELECT id, name, created_at FROM marketplaces ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(marketplaces)
    }

    /// Adds a marketplace.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already exists
    pub async fn create_marketplace(&self, name: &str) -> DbResult<Marketplace> {
        validate_marketplace_name(name)?;

        let marketplace = Marketplace {
            id: generate_id(),
            name: name.trim().to_string(),
            created_at: now(),
        };

        sqlx::query("INSERT INTO marketplaces (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&marketplace.id)
            .bind(&marketplace.name)
            .bind(marketplace.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("name", &marketplace.name),
                other => other,
            })?;

        info!(id = %marketplace.id, name = %marketplace.name, "Marketplace created");
        Ok(marketplace)
    }

    /// Deletes a marketplace. Its fees and past orders are kept.
    pub async fn delete_marketplace(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM marketplaces WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Marketplace", id));
        }

        info!(id = %id, "Marketplace deleted");
        Ok(())
    }
}

/// Active fee rules of `marketplace` on an open connection or transaction.
pub(crate) async fn active_rules(
    conn: &mut SqliteConnection,
    marketplace: &str,
) -> DbResult<Vec<FeeRule>> {
    let rows: Vec<(FeeKind, i64)> = sqlx::query_as(
        r#"
        SELECT kind, value
        FROM admin_fees
        WHERE marketplace = ?1 AND is_active = 1
        ORDER BY created_at, rowid
        "#,
    )
    .bind(marketplace)
    .fetch_all(&mut *conn)
    .await?;

    debug!(marketplace = %marketplace, count = rows.len(), "Loaded fee rules");

    Ok(rows
        .into_iter()
        .map(|(kind, value)| FeeRule { kind, value })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kasir_core::{FeeRate, Money};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn fee(marketplace: &str, kind: FeeKind, value: f64) -> NewAdminFee {
        NewAdminFee {
            marketplace: marketplace.to_string(),
            label: "Biaya Admin".to_string(),
            kind,
            value,
        }
    }

    #[tokio::test]
    async fn test_get_fees_returns_active_rules_in_order() {
        let db = setup().await;
        let repo = db.fees();

        repo.create(&fee("Shopee", FeeKind::Percentage, 8.25)).await.unwrap();
        repo.create(&fee("Shopee", FeeKind::Fixed, 1_250.0)).await.unwrap();
        let off = repo.create(&fee("Shopee", FeeKind::Fixed, 99.0)).await.unwrap();
        repo.create(&fee("Tokopedia", FeeKind::Percentage, 6.5)).await.unwrap();

        repo.set_active(&off.id, false).await.unwrap();

        let rules = repo.get_fees("Shopee").await.unwrap();
        assert_eq!(
            rules,
            vec![
                FeeRule::percentage(FeeRate::from_bps(825)),
                FeeRule::fixed(Money::from_rupiah(1_250)),
            ]
        );

        assert!(repo.get_fees("Offline").await.unwrap().is_empty());
        assert_eq!(repo.list(Some("Shopee")).await.unwrap().len(), 3);
        assert_eq!(repo.list(None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_percentage() {
        let db = setup().await;
        let err = db
            .fees()
            .create(&fee("Shopee", FeeKind::Percentage, 150.0))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(_)));
        assert!(db.fees().list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_active_and_delete_missing() {
        let db = setup().await;
        let repo = db.fees();

        assert!(repo.set_active("missing", true).await.unwrap_err().is_not_found());
        assert!(repo.delete("missing").await.unwrap_err().is_not_found());

        let created = repo.create(&fee("Lazada", FeeKind::Percentage, 4.0)).await.unwrap();
        let toggled = repo.set_active(&created.id, false).await.unwrap();
        assert!(!toggled.is_active);

        repo.delete(&created.id).await.unwrap();
        assert!(repo.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_marketplaces() {
        let db = setup().await;
        let repo = db.fees();

        repo.create_marketplace("Tokopedia").await.unwrap();
        let shopee = repo.create_marketplace("Shopee").await.unwrap();

        let err = repo.create_marketplace("Shopee").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let names: Vec<String> = repo
            .list_marketplaces()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Shopee", "Tokopedia"]);

        repo.delete_marketplace(&shopee.id).await.unwrap();
        assert_eq!(repo.list_marketplaces().await.unwrap().len(), 1);
    }
}
