//! Shared fixtures for the kasir-db integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use kasir_core::{FeeKind, NewAdminFee, NewProduct, NewSale, NewVariant, ProductDetail, SaleLine};
use kasir_db::{Database, DbConfig};

pub async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// A WAL database file in the temp directory with a real connection pool,
/// so several transactions can be open at once. Files are removed on drop.
pub struct FileDb {
    pub db: Database,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub async fn setup_file(max_connections: u32) -> FileDb {
    let path = std::env::temp_dir().join(format!("kasir-test-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(path.clone()).max_connections(max_connections))
        .await
        .unwrap();

    FileDb { db, path }
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

/// A product with one variant per `(color, stock)` pair.
pub async fn product(db: &Database, code: &str, variants: &[(&str, i64)]) -> ProductDetail {
    db.products()
        .create(&NewProduct {
            code: code.to_string(),
            name: format!("Produk {}", code),
            sell_price: 50_000,
            cost_price: 30_000,
            stock: 0,
            variants: variants
                .iter()
                .map(|(color, stock)| NewVariant {
                    color: color.to_string(),
                    stock: *stock,
                })
                .collect(),
        })
        .await
        .unwrap()
}

/// Shopee with the usual 8.25% admin fee.
pub async fn shopee_fee(db: &Database) {
    db.fees()
        .create(&NewAdminFee {
            marketplace: "Shopee".to_string(),
            label: "Biaya Admin".to_string(),
            kind: FeeKind::Percentage,
            value: 8.25,
        })
        .await
        .unwrap();
}

pub fn line(variant_id: &str, quantity: i64, sell_price: i64, cost_price: i64) -> SaleLine {
    SaleLine {
        variant_id: variant_id.to_string(),
        quantity,
        sell_price,
        cost_price,
    }
}

pub fn sale(order_code: &str, marketplace: &str, day: u32, lines: Vec<SaleLine>) -> NewSale {
    NewSale {
        order_code: order_code.to_string(),
        marketplace: marketplace.to_string(),
        date: date(day),
        lines,
    }
}
