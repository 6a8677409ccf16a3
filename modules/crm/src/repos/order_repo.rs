use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerOrderRow {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub order_date: Option<NaiveDate>,
    pub order_amount: Option<Decimal>,
    pub status: String,
    pub status_version: i64,
}

const COLUMNS: &str = "order_id, customer_id, product_id, quantity, order_date, \
                       order_amount, status, status_version";

/// Insert the projection row; a replayed creation is a no-op. Returns
/// whether a row was actually written.
pub async fn insert_if_absent(
    tx: &mut Transaction<'_, Postgres>,
    order: &CustomerOrderRow,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO customer_orders
            (order_id, customer_id, product_id, quantity, order_date,
             order_amount, status, status_version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (order_id) DO NOTHING
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(&order.product_id)
    .bind(order.quantity)
    .bind(order.order_date)
    .bind(order.order_amount)
    .bind(&order.status)
    .bind(order.status_version)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find(
    pool: &PgPool,
    order_id: &str,
) -> Result<Option<CustomerOrderRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerOrderRow>(&format!(
        "SELECT {COLUMNS} FROM customer_orders WHERE order_id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_customer(
    pool: &PgPool,
    customer_id: &str,
) -> Result<Vec<CustomerOrderRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerOrderRow>(&format!(
        "SELECT {COLUMNS} FROM customer_orders WHERE customer_id = $1 ORDER BY order_id"
    ))
    .bind(customer_id)
    .fetch_all(pool)
    .await
}

pub async fn exists(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM customer_orders WHERE order_id = $1)",
    )
    .bind(order_id)
    .fetch_one(&mut **tx)
    .await
}

/// Version-guarded status update; 0 rows means stale or missing.
pub async fn update_status_versioned(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
    status: &str,
    version: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE customer_orders
        SET status = $2,
            status_version = $3,
            updated_at = now()
        WHERE order_id = $1 AND status_version < $3
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(version)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Version-guarded detail update for order_updated events.
pub async fn update_details_versioned(
    tx: &mut Transaction<'_, Postgres>,
    order_id: &str,
    quantity: Option<i32>,
    version: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE customer_orders
        SET quantity = COALESCE($2, quantity),
            status_version = $3,
            updated_at = now()
        WHERE order_id = $1 AND status_version < $3
        "#,
    )
    .bind(order_id)
    .bind(quantity)
    .bind(version)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}
