use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: String,
    pub product_name: String,
    pub supplier: Option<String>,
    pub cost_price: Option<Decimal>,
    pub retail_price: Decimal,
    pub stock_level: i32,
}

const COLUMNS: &str =
    "product_id, product_name, supplier, cost_price, retail_price, stock_level";

pub async fn insert(pool: &PgPool, product: &ProductRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products
            (product_id, product_name, supplier, cost_price, retail_price, stock_level)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (product_id) DO NOTHING
        "#,
    )
    .bind(&product.product_id)
    .bind(&product.product_name)
    .bind(&product.supplier)
    .bind(product.cost_price)
    .bind(product.retail_price)
    .bind(product.stock_level)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find(pool: &PgPool, product_id: &str) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {COLUMNS} FROM products WHERE product_id = $1"
    ))
    .bind(product_id)
    .fetch_optional(pool)
    .await
}

/// Lock the product row for the duration of the transaction. API-triggered
/// and consumer-triggered writes to the same product serialize here.
pub async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    product_id: &str,
) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {COLUMNS} FROM products WHERE product_id = $1 FOR UPDATE"
    ))
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Decrement stock inside the caller's transaction. The CHECK constraint on
/// `stock_level` is the last line of defense against oversell; callers must
/// have verified availability under the row lock first.
pub async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: &str,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock_level = stock_level - $2 WHERE product_id = $1")
        .bind(product_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await
}
