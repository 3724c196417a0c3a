//! # Seed Data Generator
//!
//! Fills a data directory with a stationery catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured data directory
//! cargo run -p papeleria-store --bin seed
//!
//! # Seed a specific directory
//! cargo run -p papeleria-store --bin seed -- --data-dir ./data
//!
//! # Wipe the inventory first
//! cargo run -p papeleria-store --bin seed -- --data-dir ./data --reset
//! ```
//!
//! ## Generated Products
//! Every unit family the back office converts between is represented:
//! - Paper sold by the package (500 sheets)
//! - Notebooks and pens sold loose
//! - Ribbon sold by the roll (10 m)
//! - Lace sold by the meter
//! - Clips sold by the box (100 pieces)

use std::env;
use std::path::PathBuf;

use papeleria_core::{Money, Product, Role};
use papeleria_store::{init_tracing, Backoffice, EngineConfig};

/// (SKU prefix, category, unit, content, names)
const CATEGORIES: &[(&str, &str, &str, f64, &[&str])] = &[
    (
        "PAP",
        "Papel",
        "paquete",
        500.0,
        &["Hojas blancas carta", "Hojas blancas oficio", "Papel bond color", "Papel opalina"],
    ),
    (
        "CUA",
        "Cuadernos",
        "Unidad",
        1.0,
        &["Cuaderno profesional raya", "Cuaderno profesional cuadro", "Cuaderno forma italiana", "Libreta de taquigrafía"],
    ),
    (
        "ESC",
        "Escritura",
        "Unidad",
        1.0,
        &["Lápiz HB", "Pluma azul", "Pluma negra", "Marcatextos amarillo", "Goma blanca"],
    ),
    (
        "CIN",
        "Cintas",
        "rollo",
        10.0,
        &["Cinta satinada roja", "Cinta satinada blanca", "Cinta de organza dorada"],
    ),
    (
        "LIS",
        "Listón",
        "metro",
        1.0,
        &["Listón de encaje", "Listón de terciopelo"],
    ),
    (
        "CLI",
        "Oficina",
        "caja",
        100.0,
        &["Clips estándar", "Clips mariposa", "Grapas 26/6"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut data_dir: Option<PathBuf> = None;
    let mut reset = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                if i + 1 < args.len() {
                    data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--reset" | "-r" => reset = true,
            "--help" | "-h" => {
                println!("Papelería Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --data-dir <PATH>  Data directory (default: from papeleria.toml)");
                println!("  -r, --reset            Clear the inventory before seeding");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let mut config = EngineConfig::load_or_default(None);
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }

    println!("🌱 Papelería Seed Data Generator");
    println!("================================");
    println!("Data dir: {}", config.storage.data_dir.display());
    println!();

    let office = Backoffice::open(config).await?;
    println!("✓ Data directory ready");

    if reset {
        office.ledger().clear_all(Role::Admin).await?;
        println!("✓ Inventory cleared");
    }

    let existing = office.ledger().list().await?.len();
    if existing > 0 {
        println!("⚠ Inventory already has {} products", existing);
        println!("  Skipping seed to avoid overwriting stock.");
        println!("  Run with --reset to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut products = Vec::new();
    for (category_idx, (prefix, category, unit, content, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            products.push(generate_product(
                prefix,
                category,
                unit,
                *content,
                name,
                category_idx * 10 + name_idx,
            ));
        }
    }

    let start = std::time::Instant::now();
    let written = office.ledger().import_bulk(products).await?;
    println!("✓ Wrote {} products in {:?}", written, start.elapsed());

    println!();
    println!("Verifying search...");
    let hits = office.ledger().search("cuaderno").await?;
    println!("  Search 'cuaderno': {} results", hits.len());
    let hits = office.ledger().search("CIN").await?;
    println!("  Search 'CIN': {} results", hits.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with deterministic price and stock.
fn generate_product(prefix: &str, category: &str, unit: &str, content: f64, name: &str, seed: usize) -> Product {
    let sku = format!("{}-{:03}", prefix, seed % 10 + 1);

    // $5.00 - $84.50 in half-peso steps
    let price_cents = 500 + ((seed * 37) % 160) as i64 * 50;

    // 2 - 41 sale units
    let stock = (2 + (seed * 13) % 40) as f64;

    Product::new(sku, name, unit)
        .with_category(category)
        .with_content(content)
        .with_price(Money::from_cents(price_cents))
        .with_stock(stock)
}
