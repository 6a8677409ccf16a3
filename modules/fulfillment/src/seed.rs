//! Demo stock for local runs. Skipped when the ledger already has rows.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::repos::product_repo::{self, ProductRow};

pub async fn seed_demo_products(pool: &PgPool) -> Result<(), sqlx::Error> {
    if product_repo::count(pool).await? > 0 {
        return Ok(());
    }

    let products = [
        ProductRow {
            product_id: "PROD001".to_string(),
            product_name: "Laptop".to_string(),
            supplier: Some("TechSupplier".to_string()),
            cost_price: Some(Decimal::new(80000, 2)),
            retail_price: Decimal::new(120000, 2),
            stock_level: 50,
        },
        ProductRow {
            product_id: "PROD002".to_string(),
            product_name: "Smartphone".to_string(),
            supplier: Some("MobileSupplier".to_string()),
            cost_price: Some(Decimal::new(40000, 2)),
            retail_price: Decimal::new(79999, 2),
            stock_level: 100,
        },
        ProductRow {
            product_id: "PROD003".to_string(),
            product_name: "Headphones".to_string(),
            supplier: Some("AudioSupplier".to_string()),
            cost_price: Some(Decimal::new(5000, 2)),
            retail_price: Decimal::new(9999, 2),
            stock_level: 200,
        },
    ];

    for product in &products {
        product_repo::insert(pool, product).await?;
    }

    tracing::info!("Demo products seeded");
    Ok(())
}
