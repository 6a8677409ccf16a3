//! Customer/order projection maintenance.
//!
//! The CRM holds a read-side projection fed by the order fanout. Events
//! only carry the customer id, so an unknown customer is materialized with
//! a placeholder name rather than rejecting the order.

use chrono::NaiveDate;
use order_contracts::{OrderCreatedV1, OrderStatus};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::{
    customer_repo, order_repo, order_repo::CustomerOrderRow, processed_repo,
};

const PROCESSOR: &str = "crm-consumer";

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("customer {0} not found")]
    UnknownCustomer(String),

    #[error("order {0} not found")]
    NotFound(String),

    #[error("event already processed (duplicate): {0}")]
    DuplicateEvent(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type CrmResult<T> = Result<T, CrmError>;

/// Outcome of applying an event to the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

/// Project an `order_created` event. Creation is keyed on order_id, so a
/// regenerated event about a known order changes nothing.
pub async fn apply_order_created(
    pool: &PgPool,
    event_id: Uuid,
    payload: &OrderCreatedV1,
    version: i64,
) -> CrmResult<ApplyOutcome> {
    if processed_repo::exists(pool, event_id).await? {
        return Err(CrmError::DuplicateEvent(event_id));
    }

    let mut tx = pool.begin().await?;

    customer_repo::ensure_exists(&mut tx, &payload.customer_id).await?;

    let inserted = order_repo::insert_if_absent(
        &mut tx,
        &CustomerOrderRow {
            order_id: payload.order_id.clone(),
            customer_id: payload.customer_id.clone(),
            product_id: payload.product_id.clone(),
            quantity: payload.quantity,
            order_date: Some(payload.order_date),
            order_amount: Some(payload.order_amount),
            status: payload.order_status.as_str().to_string(),
            status_version: version,
        },
    )
    .await?;

    processed_repo::insert(&mut tx, event_id, "order_created", PROCESSOR).await?;
    tx.commit().await?;

    if inserted {
        tracing::info!(
            event_id = %event_id,
            order_id = %payload.order_id,
            customer_id = %payload.customer_id,
            "Customer order projected"
        );
        Ok(ApplyOutcome::Applied)
    } else {
        Ok(ApplyOutcome::Stale)
    }
}

/// Apply a `status_changed` event under the version guard.
pub async fn apply_status_change(
    pool: &PgPool,
    event_id: Uuid,
    order_id: &str,
    status: OrderStatus,
    version: i64,
) -> CrmResult<ApplyOutcome> {
    if processed_repo::exists(pool, event_id).await? {
        return Err(CrmError::DuplicateEvent(event_id));
    }

    let mut tx = pool.begin().await?;

    let updated =
        order_repo::update_status_versioned(&mut tx, order_id, status.as_str(), version).await?;

    if updated == 0 && !order_repo::exists(&mut tx, order_id).await? {
        return Err(CrmError::NotFound(order_id.to_string()));
    }

    processed_repo::insert(&mut tx, event_id, "status_changed", PROCESSOR).await?;
    tx.commit().await?;

    Ok(if updated == 0 {
        ApplyOutcome::Stale
    } else {
        ApplyOutcome::Applied
    })
}

/// Apply an `order_updated` event under the version guard.
pub async fn apply_order_update(
    pool: &PgPool,
    event_id: Uuid,
    order_id: &str,
    quantity: Option<i32>,
    version: i64,
) -> CrmResult<ApplyOutcome> {
    if processed_repo::exists(pool, event_id).await? {
        return Err(CrmError::DuplicateEvent(event_id));
    }

    let mut tx = pool.begin().await?;

    let updated =
        order_repo::update_details_versioned(&mut tx, order_id, quantity, version).await?;

    if updated == 0 && !order_repo::exists(&mut tx, order_id).await? {
        return Err(CrmError::NotFound(order_id.to_string()));
    }

    processed_repo::insert(&mut tx, event_id, "order_updated", PROCESSOR).await?;
    tx.commit().await?;

    Ok(if updated == 0 {
        ApplyOutcome::Stale
    } else {
        ApplyOutcome::Applied
    })
}

/// Register a customer order through the API (no event involved).
pub async fn create_customer_order(
    pool: &PgPool,
    order_id: String,
    customer_id: String,
    product_id: String,
    quantity: i32,
    order_date: Option<NaiveDate>,
    order_amount: Option<Decimal>,
) -> CrmResult<()> {
    if !customer_repo::exists(pool, &customer_id).await? {
        return Err(CrmError::UnknownCustomer(customer_id));
    }

    let mut tx = pool.begin().await?;
    order_repo::insert_if_absent(
        &mut tx,
        &CustomerOrderRow {
            order_id,
            customer_id,
            product_id,
            quantity,
            order_date,
            order_amount,
            status: OrderStatus::Processing.as_str().to_string(),
            status_version: 1,
        },
    )
    .await?;
    tx.commit().await?;

    Ok(())
}
