use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub customer_id: String,
    pub name: String,
    pub email: Option<String>,
}

pub async fn insert(pool: &PgPool, customer: &CustomerRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO customers (customer_id, name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (customer_id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email
        "#,
    )
    .bind(&customer.customer_id)
    .bind(&customer.name)
    .bind(&customer.email)
    .execute(pool)
    .await?;

    Ok(())
}

/// Make sure a customer row exists for an incoming order event. Events only
/// carry the id, so the placeholder name is the id until the customer is
/// registered properly.
pub async fn ensure_exists(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO customers (customer_id, name)
        VALUES ($1, $1)
        ON CONFLICT (customer_id) DO NOTHING
        "#,
    )
    .bind(customer_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn exists(pool: &PgPool, customer_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE customer_id = $1)",
    )
    .bind(customer_id)
    .fetch_one(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<CustomerRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerRow>(
        "SELECT customer_id, name, email FROM customers ORDER BY customer_id",
    )
    .fetch_all(pool)
    .await
}
