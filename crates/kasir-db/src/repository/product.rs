//! # Product Repository
//!
//! Catalog operations: products, their color variants, and variant stock.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ Read, check in Rust, then write an absolute value                  │
//! │     SELECT stock ...; UPDATE variants SET stock = 7 WHERE id = ?       │
//! │                                                                         │
//! │  ✅ One conditional delta update                                       │
//! │     UPDATE variants SET stock = stock + ?delta                         │
//! │     WHERE id = ? AND stock + ?delta >= 0                               │
//! │                                                                         │
//! │  0 rows affected → re-read: missing variant or not enough stock.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, generate_id, now};
use kasir_core::validation::{validate_new_product, validate_stock_delta};
use kasir_core::{NewProduct, NewVariant, Product, ProductDetail, Variant};

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products with their variants, newest first.
    ///
    /// Two queries (products, then every variant) grouped in memory, so the
    /// catalog page costs the same regardless of product count.
    pub async fn list(&self) -> DbResult<Vec<ProductDetail>> {
        let products: Vec<Product> = sqlx::query_as(
            r#"
            SELECT id, code, name, sell_price, cost_price, stock, created_at, updated_at
            FROM products
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let variants: Vec<Variant> =
            sqlx::query_as("SELECT id, product_id, color, stock FROM variants ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;

        let mut by_product: HashMap<String, Vec<Variant>> = HashMap::new();
        for variant in variants {
            by_product
                .entry(variant.product_id.clone())
                .or_default()
                .push(variant);
        }

        debug!(count = products.len(), "Listed products");

        Ok(products
            .into_iter()
            .map(|product| {
                let variants = by_product.remove(&product.id).unwrap_or_default();
                ProductDetail { product, variants }
            })
            .collect())
    }

    /// Gets a product with its variants.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn get(&self, id: &str) -> DbResult<ProductDetail> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Creates a product and its variants in one transaction.
    ///
    /// ## Arguments
    /// * `input` - Validated first; prices up to `MAX_PRICE`, stock up to
    ///   `MAX_STOCK`, variant colors unique
    ///
    /// ## Returns
    /// * `Ok(ProductDetail)` - The product with its variants, in input order
    /// * `Err(DbError::Domain(Validation))` - Rejected before any write
    /// * `Err(DbError::UniqueViolation)` - Product code already exists
    pub async fn create(&self, input: &NewProduct) -> DbResult<ProductDetail> {
        validate_new_product(input)?;

        let now = now();
        let product = Product {
            id: generate_id(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            sell_price: input.sell_price,
            cost_price: input.cost_price,
            stock: input.stock,
            created_at: now,
            updated_at: now,
        };

        debug!(code = %product.code, variants = input.variants.len(), "Creating product");

        let mut tx = begin_write(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, sell_price, cost_price, stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.sell_price)
        .bind(product.cost_price)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_code(e, &product.code))?;

        let mut variants = Vec::with_capacity(input.variants.len());
        for new_variant in &input.variants {
            variants.push(insert_variant(&mut tx, &product.id, new_variant).await?);
        }

        tx.commit().await?;

        info!(id = %product.id, code = %product.code, "Product created");
        Ok(ProductDetail { product, variants })
    }

    /// Updates a product and replaces its variant set in one transaction.
    ///
    /// Variants are matched by color (case-insensitive): matching ones keep
    /// their id and take the new stock, new colors are inserted, and colors
    /// no longer listed are removed. Sold lines keep pointing at surviving
    /// variants, so reversing them still restores stock.
    pub async fn update(&self, id: &str, input: &NewProduct) -> DbResult<ProductDetail> {
        validate_new_product(input)?;

        let code = input.code.trim();
        debug!(id = %id, code = %code, "Updating product");

        let mut tx = begin_write(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                sell_price = ?4,
                cost_price = ?5,
                stock = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(input.name.trim())
        .bind(input.sell_price)
        .bind(input.cost_price)
        .bind(input.stock)
        .bind(now())
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_code(e, code))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let existing: Vec<Variant> =
            sqlx::query_as("SELECT id, product_id, color, stock FROM variants WHERE product_id = ?1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let mut by_color: HashMap<String, Variant> = existing
            .into_iter()
            .map(|v| (color_key(&v.color), v))
            .collect();

        for new_variant in &input.variants {
            match by_color.remove(&color_key(&new_variant.color)) {
                Some(current) => {
                    sqlx::query("UPDATE variants SET color = ?2, stock = ?3 WHERE id = ?1")
                        .bind(&current.id)
                        .bind(new_variant.color.trim())
                        .bind(new_variant.stock)
                        .execute(&mut *tx)
                        .await?;
                }
                None => {
                    insert_variant(&mut tx, id, new_variant).await?;
                }
            }
        }

        for removed in by_color.values() {
            debug!(variant_id = %removed.id, color = %removed.color, "Removing variant");
            sqlx::query("DELETE FROM variants WHERE id = ?1")
                .bind(&removed.id)
                .execute(&mut *tx)
                .await?;
        }

        let detail = fetch_detail(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit().await?;

        info!(id = %id, variants = detail.variants.len(), "Product updated");
        Ok(detail)
    }

    /// Deletes a product; its variants go with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Current stock of a variant.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Unknown variant
    pub async fn get_variant_stock(&self, variant_id: &str) -> DbResult<i64> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM variants WHERE id = ?1")
            .bind(variant_id)
            .fetch_optional(&self.pool)
            .await?;

        stock.ok_or_else(|| DbError::not_found("Variant", variant_id))
    }

    /// Adds `delta` (negative to take out) to a variant's stock.
    ///
    /// ## Arguments
    /// * `delta` - Units to add, at most `MAX_STOCK` either way
    ///
    /// ## Returns
    /// * `Ok(stock)` - The new stock level
    /// * `Err(DbError::Domain(Validation))` - `delta` out of range
    /// * `Err(DbError::Domain(InsufficientStock))` - Result would be negative
    /// * `Err(DbError::NotFound)` - Unknown variant
    pub async fn adjust_variant_stock(&self, variant_id: &str, delta: i64) -> DbResult<i64> {
        validate_stock_delta(delta)?;

        debug!(variant_id = %variant_id, delta = delta, "Adjusting variant stock");

        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, variant_id, delta).await
    }
}

// =============================================================================
// Shared helpers (usable inside other repositories' transactions)
// =============================================================================

/// Catalog details copied onto a sold line.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct VariantSnapshot {
    pub product_code: String,
    pub product_name: String,
    pub color: String,
}

/// Atomically applies `delta` to a variant's stock if the result stays ≥ 0.
///
/// The `UPDATE` itself is the check: zero affected rows means either the
/// variant is missing or the stock is too low, and the follow-up read tells
/// the two apart. Inside a sale transaction the write lock is already held,
/// so the read sees exactly the row the `UPDATE` looked at.
pub(crate) async fn adjust_stock(
    conn: &mut SqliteConnection,
    variant_id: &str,
    delta: i64,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        UPDATE variants
        SET stock = stock + ?1
        WHERE id = ?2 AND stock + ?1 >= 0
        "#,
    )
    .bind(delta)
    .bind(variant_id)
    .execute(&mut *conn)
    .await?;

    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM variants WHERE id = ?1")
        .bind(variant_id)
        .fetch_optional(&mut *conn)
        .await?;

    match (result.rows_affected(), stock) {
        (_, None) => Err(DbError::not_found("Variant", variant_id)),
        (0, Some(available)) => Err(DbError::insufficient_stock(
            variant_id,
            available,
            delta.saturating_neg(),
        )),
        (_, Some(stock)) => Ok(stock),
    }
}

/// Puts `quantity` units back on a variant.
///
/// Returns `false` when the variant no longer exists.
pub(crate) async fn restore_stock(
    conn: &mut SqliteConnection,
    variant_id: &str,
    quantity: i64,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE variants SET stock = stock + ?1 WHERE id = ?2")
        .bind(quantity)
        .bind(variant_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Product code, product name and color of a variant.
pub(crate) async fn variant_snapshot(
    conn: &mut SqliteConnection,
    variant_id: &str,
) -> DbResult<VariantSnapshot> {
    let snapshot: Option<VariantSnapshot> = sqlx::query_as(
        r#"
        SELECT p.code AS product_code, p.name AS product_name, v.color
        FROM variants v
        INNER JOIN products p ON p.id = v.product_id
        WHERE v.id = ?1
        "#,
    )
    .bind(variant_id)
    .fetch_optional(&mut *conn)
    .await?;

    snapshot.ok_or_else(|| DbError::not_found("Variant", variant_id))
}

async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<ProductDetail>> {
    let product: Option<Product> = sqlx::query_as(
        r#"
        SELECT id, code, name, sell_price, cost_price, stock, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(product) = product else {
        return Ok(None);
    };

    let variants: Vec<Variant> = sqlx::query_as(
        "SELECT id, product_id, color, stock FROM variants WHERE product_id = ?1 ORDER BY rowid",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(ProductDetail { product, variants }))
}

async fn insert_variant(
    conn: &mut SqliteConnection,
    product_id: &str,
    input: &NewVariant,
) -> DbResult<Variant> {
    let variant = Variant {
        id: generate_id(),
        product_id: product_id.to_string(),
        color: input.color.trim().to_string(),
        stock: input.stock,
    };

    sqlx::query("INSERT INTO variants (id, product_id, color, stock) VALUES (?1, ?2, ?3, ?4)")
        .bind(&variant.id)
        .bind(&variant.product_id)
        .bind(&variant.color)
        .bind(variant.stock)
        .execute(&mut *conn)
        .await?;

    Ok(variant)
}

fn color_key(color: &str) -> String {
    color.trim().to_lowercase()
}

fn duplicate_code(err: sqlx::Error, code: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("code", code),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kasir_core::{CoreError, ValidationError};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn gamis() -> NewProduct {
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

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let repo = db.products();

        let created = repo.create(&gamis()).await.unwrap();
        assert_eq!(created.variants.len(), 2);
        assert_eq!(created.total_stock(), 7);

        let fetched = repo.get(&created.product.id).await.unwrap();
        assert_eq!(fetched.product.code, "GMS-01");
        assert_eq!(fetched.variants[0].color, "Hitam");
        assert_eq!(fetched.variants[1].stock, 2);

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].variants.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = setup().await;
        let repo = db.products();

        repo.create(&gamis()).await.unwrap();
        let err = repo.create(&gamis()).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "code"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_product_rejected_before_write() {
        let db = setup().await;
        let mut input = gamis();
        input.sell_price = -1;

        let err = db.products().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Negative { .. }))
        ));
        assert!(db.products().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_matching_variants() {
        let db = setup().await;
        let repo = db.products();
        let created = repo.create(&gamis()).await.unwrap();
        let hitam_id = created.variants[0].id.clone();

        let mut input = gamis();
        input.name = "Gamis Polos Premium".to_string();
        input.variants = vec![
            NewVariant {
                color: "hitam".to_string(),
                stock: 9,
            },
            NewVariant {
                color: "Maroon".to_string(),
                stock: 1,
            },
        ];

        let updated = repo.update(&created.product.id, &input).await.unwrap();
        assert_eq!(updated.product.name, "Gamis Polos Premium");
        assert_eq!(updated.variants.len(), 2);

        let hitam = updated.variants.iter().find(|v| v.id == hitam_id).unwrap();
        assert_eq!(hitam.stock, 9);
        assert!(updated.variants.iter().any(|v| v.color == "Maroon"));
        assert!(!updated.variants.iter().any(|v| v.color == "Navy"));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = setup().await;
        let err = db
            .products()
            .update(&generate_id(), &gamis())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_variants() {
        let db = setup().await;
        let repo = db.products();
        let created = repo.create(&gamis()).await.unwrap();
        let variant_id = created.variants[0].id.clone();

        repo.delete(&created.product.id).await.unwrap();

        assert!(repo.get(&created.product.id).await.unwrap_err().is_not_found());
        assert!(repo.get_variant_stock(&variant_id).await.unwrap_err().is_not_found());
        assert!(repo.delete(&created.product.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_adjust_variant_stock() {
        let db = setup().await;
        let repo = db.products();
        let created = repo.create(&gamis()).await.unwrap();
        let variant_id = created.variants[0].id.clone();

        assert_eq!(repo.adjust_variant_stock(&variant_id, 3).await.unwrap(), 8);
        assert_eq!(repo.adjust_variant_stock(&variant_id, -8).await.unwrap(), 0);

        let err = repo.adjust_variant_stock(&variant_id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 0,
                requested: 1,
                ..
            })
        ));
        assert_eq!(repo.get_variant_stock(&variant_id).await.unwrap(), 0);

        let err = repo.adjust_variant_stock("missing", 1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_adjust_variant_stock_rejects_out_of_range_delta() {
        let db = setup().await;
        let repo = db.products();
        let created = repo.create(&gamis()).await.unwrap();
        let variant_id = created.variants[0].id.clone();

        for delta in [i64::MIN, i64::MAX, -(kasir_core::MAX_STOCK + 1)] {
            let err = repo.adjust_variant_stock(&variant_id, delta).await.unwrap_err();
            assert!(matches!(
                err,
                DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
            ));
        }
        assert_eq!(repo.get_variant_stock(&variant_id).await.unwrap(), 5);

        // largest allowed withdrawal reports the requested amount unchanged
        let err = repo
            .adjust_variant_stock(&variant_id, -kasir_core::MAX_STOCK)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 5,
                requested: kasir_core::MAX_STOCK,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_price_above_limit_rejected_before_write() {
        let db = setup().await;
        let mut input = gamis();
        input.sell_price = kasir_core::MAX_PRICE + 1;

        let err = db.products().create(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(db.products().list().await.unwrap().is_empty());
    }
}
