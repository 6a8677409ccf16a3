use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub order_status: String,
    pub status_version: i64,
    pub shipping_date: Option<NaiveDate>,
}

const COLUMNS: &str =
    "order_id, customer_id, product_id, quantity, order_status, status_version, shipping_date";

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    order: &OrderRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders
            (order_id, customer_id, product_id, quantity, order_status,
             status_version, shipping_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(&order.product_id)
    .bind(order.quantity)
    .bind(&order.order_status)
    .bind(order.status_version)
    .bind(order.shipping_date)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn find(pool: &PgPool, order_id: &str) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE order_id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_tx(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE order_id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Transition an order's status, bumping its version. Returns the updated
/// row, or `None` when the order does not exist.
pub async fn transition_status(
    pool: &PgPool,
    order_id: &str,
    status: &str,
    shipping_date: Option<NaiveDate>,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        UPDATE orders
        SET order_status = $2,
            status_version = status_version + 1,
            shipping_date = COALESCE($3, shipping_date),
            updated_at = now()
        WHERE order_id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(order_id)
    .bind(status)
    .bind(shipping_date)
    .fetch_optional(pool)
    .await
}
