use rust_decimal::Decimal;
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

pub async fn insert(pool: &PgPool, product: &ProductRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products (product_id, product_name, category, price, stock_quantity)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (product_id) DO UPDATE
            SET product_name = EXCLUDED.product_name,
                category = EXCLUDED.category,
                price = EXCLUDED.price,
                stock_quantity = EXCLUDED.stock_quantity
        "#,
    )
    .bind(&product.product_id)
    .bind(&product.product_name)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.stock_quantity)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find(pool: &PgPool, product_id: &str) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        "SELECT product_id, product_name, category, price, stock_quantity
         FROM products WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        "SELECT product_id, product_name, category, price, stock_quantity
         FROM products ORDER BY product_id",
    )
    .fetch_all(pool)
    .await
}
