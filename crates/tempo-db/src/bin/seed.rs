//! # Seed Data Generator
//!
//! Populates the database with demo catalog, users, and coupons.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p tempo-db --bin seed
//!
//! # Specify database path
//! cargo run -p tempo-db --bin seed -- --db ./data/tempo.db
//! ```
//!
//! ## Generated Data
//! - A catalog of instruments and accessories across categories
//! - Two demo customers
//! - Three coupons: SAVE10 (10% capped), BIENVENIDA (fixed, min purchase),
//!   ENVIOGRATIS (free shipping)

use std::env;

use tempo_core::{Coupon, DiscountType};
use tempo_db::{CouponRepository, Database, DbConfig, ProductRepository, UserRepository};
use tracing_subscriber::EnvFilter;

/// (name, category, price in base cents, stock, featured)
const CATALOG: &[(&str, &str, i64, i64, bool)] = &[
    ("Stratocaster Sunburst", "guitars", 1_500_000, 8, true),
    ("Telecaster Butterscotch", "guitars", 1_800_000, 5, true),
    ("Les Paul Studio", "guitars", 2_400_000, 3, false),
    ("Jazz Bass", "basses", 1_950_000, 4, false),
    ("Precision Bass", "basses", 1_750_000, 6, false),
    ("Tube Amp 15W", "amps", 850_000, 10, true),
    ("Practice Amp 10W", "amps", 280_000, 20, false),
    ("Overdrive Pedal", "effects", 180_000, 25, false),
    ("Delay Pedal", "effects", 240_000, 15, false),
    ("Reverb Pedal", "effects", 260_000, 12, false),
    ("Leather Strap", "accessories", 45_000, 40, false),
    ("String Set 10-46", "accessories", 18_000, 100, false),
    ("Hard Case", "accessories", 320_000, 10, false),
    ("Tuner Clip", "accessories", 25_000, 60, false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./tempo_dev.db");

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
                println!("Tempo Store Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tempo_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tempo Store Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");
    for (name, category, price_cents, stock, featured) in CATALOG {
        let mut product = ProductRepository::new_product(*name, *category, *price_cents, *stock);
        product.is_featured = *featured;
        db.products().insert(&product).await?;
    }
    println!("✓ {} products", CATALOG.len());

    println!("Seeding users...");
    let ana = UserRepository::new_user("ana@example.com", "Ana García");
    let vip = UserRepository::new_user("vip@example.com", "Valeria Ibáñez");
    db.users().insert(&ana).await?;
    db.users().insert(&vip).await?;
    println!("✓ 2 users");

    println!("Seeding coupons...");
    let save10 = Coupon {
        name: "10% de descuento".to_string(),
        max_discount_cents: Some(5_000),
        ..CouponRepository::new_coupon("SAVE10", DiscountType::Percentage, 1000)
    };
    db.coupons().insert(&save10).await?;

    let bienvenida = Coupon {
        name: "Regalo de bienvenida".to_string(),
        min_purchase_cents: 50_000,
        one_per_user: true,
        restricted_email: Some("vip@example.com".to_string()),
        ..CouponRepository::new_coupon("BIENVENIDA", DiscountType::Fixed, 10_000)
    };
    db.coupons().insert(&bienvenida).await?;

    let envio = Coupon {
        name: "Envío gratis".to_string(),
        max_uses: Some(100),
        ..CouponRepository::new_coupon("ENVIOGRATIS", DiscountType::FreeShipping, 0)
    };
    db.coupons().insert(&envio).await?;
    println!("✓ 3 coupons (SAVE10, BIENVENIDA, ENVIOGRATIS)");

    println!();
    println!("Done.");
    Ok(())
}
