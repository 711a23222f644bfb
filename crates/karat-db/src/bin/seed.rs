//! # Seed Data Generator
//!
//! Populates the database with demo invoices and catalog items.
//!
//! ## Usage
//! ```bash
//! # Seed ./karat.db (or $KARAT_DB_PATH)
//! cargo run -p karat-db --bin karat-seed
//!
//! # Specify database path, and commit one demo entry per invoice
//! cargo run -p karat-db --bin karat-seed -- --db ./data/karat.db --with-entries
//! ```
//!
//! ## Generated Data
//! - Invoices from three suppliers across Gold 22/18 and Silver 92.5,
//!   with purities written the way suppliers write them (`22.00`, `18.0`)
//! - Catalog items for every key, plus a Platinum item no invoice matches

use rust_decimal::Decimal;
use std::env;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use karat_core::{JewelryItem, MetalReceiptLine, Weight};
use karat_db::{Database, DbConfig};

/// (invoice number, supplier, [(metal, purity, grams)])
const INVOICES: &[(&str, &str, &[(&str, &str, i64)])] = &[
    (
        "PI-2024-001",
        "Acme Bullion",
        &[("Gold", "22.00", 100), ("Gold", "18", 40)],
    ),
    (
        "PI-2024-002",
        "Northern Metals",
        &[("Silver", "92.5", 500), ("Gold", "22", 25)],
    ),
    ("PI-2024-003", "Coastal Refinery", &[("Gold", "18.0", 60)]),
];

/// (code, name, metal, purity, milligrams)
const ITEMS: &[(&str, &str, &str, &str, i64)] = &[
    ("RING-22-001", "Plain band", "Gold", "22", 5_000),
    ("RING-22-002", "Filigree ring", "Gold", "22.0", 7_250),
    ("CHAIN-22-001", "Rope chain", "Gold", "22", 18_500),
    ("RING-18-001", "Solitaire setting", "Gold", "18", 3_400),
    ("BNG-18-001", "Bangle", "Gold", "18.00", 12_000),
    ("ANK-925-001", "Anklet", "Silver", "92.5", 22_000),
    ("TOE-925-001", "Toe ring pair", "Silver", "92.50", 4_500),
    ("RING-PT-001", "Platinum band", "Platinum", "95", 6_000),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,karat=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut config = DbConfig::from_env()?;
    let mut with_entries = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--with-entries" | "-e" => with_entries = true,
            "--help" | "-h" => {
                println!("Karat Seed Data Generator");
                println!();
                println!("Usage: karat-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: $KARAT_DB_PATH or ./karat.db)");
                println!("  -e, --with-entries   Commit one demo stock entry per invoice");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Karat Seed Data Generator");
    println!("=========================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;
    let ledger = db.ledger();

    let schema = db.schema_status().await?;
    println!(
        "Schema: v{} ({}), {} pending",
        schema.version.unwrap_or(0),
        schema.description.as_deref().unwrap_or("none"),
        schema.pending
    );

    let existing = db.invoices().list_all().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} invoices", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (code, name, metal, purity, mg) in ITEMS {
        let purity: Decimal = purity.parse()?;
        let item = JewelryItem::new(*code, *name, *metal, purity, Weight::from_milligrams(*mg));
        ledger.add_item(item).await?;
    }
    println!("✓ {} catalog items", ITEMS.len());

    let mut invoices = Vec::with_capacity(INVOICES.len());
    for (number, supplier, receipts) in INVOICES {
        let receipts = receipts
            .iter()
            .map(|(metal, purity, grams)| {
                Ok(MetalReceiptLine::new(
                    *metal,
                    purity.parse::<Decimal>()?,
                    Weight::from_grams(*grams),
                ))
            })
            .collect::<Result<Vec<_>, rust_decimal::Error>>()?;
        invoices.push(ledger.create_invoice(number, supplier, receipts).await?);
    }
    println!("✓ {} purchase invoices", invoices.len());

    if with_entries {
        for invoice in &invoices {
            let matching = ledger.list_items_matching_invoice(&invoice.id).await?;
            let Some(item) = matching.first() else {
                continue;
            };

            let mut draft = ledger.open_draft().await?;
            ledger.select_invoice(&mut draft, &invoice.id).await?;
            ledger.add_line(&mut draft, &item.item_code, 2, None).await?;
            let entry = ledger.commit_entry(&draft).await?;
            info!(entry_number = %entry.entry_number, "Demo entry committed");
        }
    }

    println!();
    for invoice in &invoices {
        println!("{} ({})", invoice.invoice_number, invoice.supplier_name);
        for pool in ledger.get_pools(&invoice.id).await? {
            println!(
                "  {:<12} received {:>12}  consumed {:>12}  available {:>12}",
                pool.key.to_string(),
                pool.received.to_string(),
                pool.consumed.to_string(),
                pool.available.to_string()
            );
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
