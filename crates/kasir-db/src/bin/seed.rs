//! # Seed Data Generator
//!
//! Populates a development database with marketplaces, admin fees and a
//! small catalog of products with color variants.
//!
//! ## Usage
//! ```bash
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```

use std::env;

use kasir_core::{FeeKind, NewAdminFee, NewProduct};
use kasir_db::{Database, DbConfig};

/// Marketplaces offered in the sales form.
const MARKETPLACES: &[&str] = &["Shopee", "Tokopedia", "Lazada", "TikTok Shop", "Offline"];

/// `(marketplace, label, kind, value as typed in the fee form)`
const FEES: &[(&str, &str, FeeKind, f64)] = &[
    ("Shopee", "Biaya Administrasi", FeeKind::Percentage, 8.25),
    ("Shopee", "Biaya Proses Pesanan", FeeKind::Fixed, 1_250.0),
    ("Tokopedia", "Biaya Layanan", FeeKind::Percentage, 6.5),
    ("Lazada", "Biaya Administrasi", FeeKind::Percentage, 5.0),
    ("TikTok Shop", "Komisi Platform", FeeKind::Percentage, 4.0),
];

/// Sample catalog, in the same JSON shape `POST /api/products` accepts.
const CATALOG: &str = r#"[
    {
        "code": "GMS-01", "name": "Gamis Polos Katun",
        "sell_price": 125000, "cost_price": 78000,
        "variants": [
            { "color": "Hitam", "stock": 12 },
            { "color": "Navy", "stock": 8 },
            { "color": "Maroon", "stock": 5 }
        ]
    },
    {
        "code": "KHM-02", "name": "Khimar Instan Jersey",
        "sell_price": 65000, "cost_price": 38000,
        "variants": [
            { "color": "Hitam", "stock": 20 },
            { "color": "Dusty Pink", "stock": 14 },
            { "color": "Mocca", "stock": 9 }
        ]
    },
    {
        "code": "PSM-03", "name": "Pashmina Ceruti",
        "sell_price": 45000, "cost_price": 22000,
        "variants": [
            { "color": "Sage", "stock": 18 },
            { "color": "Cream", "stock": 0 }
        ]
    },
    {
        "code": "MKN-04", "name": "Mukena Travel",
        "sell_price": 150000, "cost_price": 95000,
        "variants": [
            { "color": "Putih", "stock": 6 }
        ]
    }
]"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kasir_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasir Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} products", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for name in MARKETPLACES {
        db.fees().create_marketplace(name).await?;
    }
    println!("✓ {} marketplaces", MARKETPLACES.len());

    for (marketplace, label, kind, value) in FEES {
        db.fees()
            .create(&NewAdminFee {
                marketplace: marketplace.to_string(),
                label: label.to_string(),
                kind: *kind,
                value: *value,
            })
            .await?;
    }
    println!("✓ {} admin fees", FEES.len());

    let catalog: Vec<NewProduct> = serde_json::from_str(CATALOG)?;
    for input in &catalog {
        if let Err(e) = db.products().create(input).await {
            eprintln!("Failed to insert {}: {}", input.code, e);
            continue;
        }
        println!("  + {} {} ({} colors)", input.code, input.name, input.variants.len());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
