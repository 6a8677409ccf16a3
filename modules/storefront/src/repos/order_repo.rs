use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub order_id: String,
    pub customer_id: String,
    pub email: String,
    pub address: String,
    pub product_id: String,
    pub quantity: i32,
    pub payment_method: String,
    pub order_date: NaiveDate,
    pub order_amount: Decimal,
    pub status: String,
    pub status_version: i64,
    pub delivery_date: Option<NaiveDate>,
}

const COLUMNS: &str = "order_id, customer_id, email, address, product_id, quantity, \
                       payment_method, order_date, order_amount, status, status_version, \
                       delivery_date";

pub async fn insert(pool: &PgPool, order: &OrderRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders
            (order_id, customer_id, email, address, product_id, quantity,
             payment_method, order_date, order_amount, status, status_version, delivery_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(&order.email)
    .bind(&order.address)
    .bind(&order.product_id)
    .bind(order.quantity)
    .bind(&order.payment_method)
    .bind(order.order_date)
    .bind(order.order_amount)
    .bind(&order.status)
    .bind(order.status_version)
    .bind(order.delivery_date)
    .execute(pool)
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

pub async fn list_all(pool: &PgPool) -> Result<Vec<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn exists(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE order_id = $1)")
        .bind(order_id)
        .fetch_one(&mut **tx)
        .await
}

/// Apply a status transition, guarded by the monotonic version.
///
/// Returns the number of rows updated: 0 means the stored version is equal
/// or newer (or the order does not exist), so the caller must distinguish
/// stale from missing via [`exists`].
pub async fn update_status_versioned(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
    status: &str,
    delivery_date: Option<NaiveDate>,
    version: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = $2,
            status_version = $3,
            delivery_date = COALESCE($4, delivery_date),
            updated_at = now()
        WHERE order_id = $1 AND status_version < $3
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(version)
    .bind(delivery_date)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Apply quantity/shipping adjustments under the same version guard.
pub async fn update_details_versioned(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
    quantity: Option<i32>,
    delivery_date: Option<NaiveDate>,
    version: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET quantity = COALESCE($2, quantity),
            delivery_date = COALESCE($3, delivery_date),
            status_version = $4,
            updated_at = now()
        WHERE order_id = $1 AND status_version < $4
        "#,
    )
    .bind(order_id)
    .bind(quantity)
    .bind(delivery_date)
    .bind(version)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
