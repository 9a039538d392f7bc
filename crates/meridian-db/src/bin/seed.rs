//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p meridian-db --bin seed
//!
//! # Specify database path
//! cargo run -p meridian-db --bin seed -- --db ./data/meridian.db
//! ```
//!
//! ## Generated Data
//! - 2 locations with distinct tax rates
//! - A catalog of bags and travel gear with images and features
//! - A handful of enrolled loyalty customers

use std::env;

use chrono::Utc;
use meridian_core::{Location, Product, TaxRate};
use meridian_db::repository::location::generate_location_id;
use meridian_db::repository::product::generate_product_id;
use meridian_db::{Database, DbConfig, NewCustomer, ProductFeatureInput, ProductImageInput};

/// (sku, name, category, brand, collection, material, color, price_cents, stock)
const CATALOG: &[(&str, &str, &str, &str, &str, &str, &str, i64, i64)] = &[
    (
        "BPK-001", "Metro Backpack 15\"", "Backpacks", "Kestrel", "Metro", "Ballistic Nylon",
        "Black", 12900, 24,
    ),
    (
        "BPK-002", "Metro Backpack 13\"", "Backpacks", "Kestrel", "Metro", "Ballistic Nylon",
        "Charcoal", 11900, 18,
    ),
    (
        "TOT-001", "Harbor Tote", "Totes", "Kestrel", "Harbor", "Waxed Canvas", "Olive", 8900, 30,
    ),
    (
        "TOT-002", "Harbor Tote Mini", "Totes", "Kestrel", "Harbor", "Waxed Canvas", "Navy",
        6900, 12,
    ),
    (
        "DUF-001", "Transit Duffel 40L", "Duffels", "Alto", "Transit", "Recycled Polyester",
        "Black", 14900, 9,
    ),
    (
        "DUF-002", "Transit Duffel 60L", "Duffels", "Alto", "Transit", "Recycled Polyester",
        "Forest", 16900, 4,
    ),
    (
        "SLG-001", "Courier Sling", "Slings", "Alto", "Courier", "Ripstop Nylon", "Slate",
        5900, 40,
    ),
    (
        "ACC-001", "Packing Cube Set", "Accessories", "Alto", "Transit", "Ripstop Nylon", "Mixed",
        3900, 55,
    ),
];

/// (name, email, loyalty_number)
const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("John Doe", "john.doe@example.com", "JDO123"),
    ("Maria Alvarez", "maria@example.com", "MAL456"),
    ("Sam Okafor", "sam.okafor@example.com", "SOK789"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = parse_db_path().unwrap_or_else(|| "meridian.db".to_string());
    println!("Seeding database at {db_path}");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    seed_locations(&db).await?;
    seed_products(&db).await?;
    seed_customers(&db).await?;

    let products = db.products().count().await?;
    let customers = db.customers().count().await?;
    println!("Done: {products} products, {customers} customers");

    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

async fn seed_locations(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let stores = [
        ("NYC01", "Fifth Avenue Flagship", 0.08875),
        ("POR01", "Portland Pearl District", 0.0),
    ];

    for (code, name, rate) in stores {
        let location = Location {
            id: generate_location_id(),
            store_code: code.to_string(),
            name: name.to_string(),
            brand: Some("Meridian".to_string()),
            address: None,
            manager: None,
            logo_url: None,
            phone: None,
            email: None,
            tax_rate_bps: Some(TaxRate::from_decimal(rate).bps()),
            created_at: now,
            updated_at: now,
        };
        match db.locations().insert(&location).await {
            Ok(()) => println!("  location {code}"),
            Err(e) if e.to_string().contains("already exists") => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn seed_products(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();

    for (sku, name, category, brand, collection, material, color, price_cents, stock) in CATALOG {
        if db.products().get_by_sku(sku).await?.is_some() {
            continue;
        }

        let product = Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            name: name.to_string(),
            category: Some(category.to_string()),
            product_type: Some(category.trim_end_matches('s').to_string()),
            brand: Some(brand.to_string()),
            collection: Some(collection.to_string()),
            material: Some(material.to_string()),
            color: Some(color.to_string()),
            gender: Some("Unisex".to_string()),
            laptop_size: name.contains('"').then(|| {
                name.split_whitespace()
                    .last()
                    .unwrap_or_default()
                    .to_string()
            }),
            description: Some(format!("{name} in {material}.")),
            dimensions: None,
            weight: None,
            care_instructions: Some("Spot clean with a damp cloth.".to_string()),
            warranty_info: Some("Limited lifetime warranty.".to_string()),
            price_cents: *price_cents,
            stock_quantity: *stock,
            is_active: true,
            is_featured: *stock > 20,
            image_url: Some(format!("/images/{}.jpg", sku.to_lowercase())),
            created_at: now,
            updated_at: now,
        };

        let images = vec![ProductImageInput {
            url: format!("/images/{}-alt.jpg", sku.to_lowercase()),
            alt_text: Some(format!("{name}, side view")),
            is_primary: false,
        }];
        let features = vec![
            ProductFeatureInput {
                name: "Material".to_string(),
                value: material.to_string(),
            },
            ProductFeatureInput {
                name: "Collection".to_string(),
                value: collection.to_string(),
            },
        ];

        db.products().insert(&product, &images, &features).await?;
        println!("  product {sku}");
    }

    Ok(())
}

async fn seed_customers(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    for (name, email, number) in CUSTOMERS {
        if db.customers().get_by_loyalty_number(number).await?.is_some() {
            continue;
        }

        db.customers()
            .enroll(&NewCustomer {
                name: name.to_string(),
                email: Some(email.to_string()),
                phone: None,
                loyalty_number: Some(number.to_string()),
            })
            .await?;
        println!("  customer {number}");
    }

    Ok(())
}
