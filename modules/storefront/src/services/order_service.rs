//! Order intake and idempotent event application.
//!
//! The storefront owns the customer-facing order record. It is created by
//! the API and from then on mutated only by status events coming back from
//! fulfillment; the version guard makes replays and out-of-order delivery
//! converge on the newest state.

use chrono::{Duration, NaiveDate, Utc};
use order_contracts::OrderStatus;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::{order_repo, order_repo::OrderRow, processed_repo, product_repo};

/// Version assigned to a freshly created order.
pub const INITIAL_STATUS_VERSION: i64 = 1;

const PROCESSOR: &str = "storefront-consumer";

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("product {0} not found")]
    UnknownProduct(String),

    #[error("order {0} not found")]
    NotFound(String),

    #[error("event already processed (duplicate): {0}")]
    DuplicateEvent(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Input for a new order from the API.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: String,
    pub email: String,
    pub address: String,
    pub product_id: String,
    pub quantity: i32,
    pub payment_method: String,
}

/// Outcome of applying a status or detail event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The local record was updated.
    Applied,
    /// The stored version is equal or newer; nothing changed.
    Stale,
}

/// Expected delivery date quoted at order time.
pub fn delivery_date_for(order_date: NaiveDate) -> NaiveDate {
    order_date + Duration::days(5)
}

/// Create an order from the API and return the stored row.
///
/// The order commits locally whatever later happens on the bus; publishing
/// is the caller's fire-and-forget concern.
pub async fn create_order(pool: &PgPool, new_order: NewOrder) -> OrderResult<OrderRow> {
    let product = product_repo::find(pool, &new_order.product_id)
        .await?
        .ok_or_else(|| OrderError::UnknownProduct(new_order.product_id.clone()))?;

    let order_date = Utc::now().date_naive();
    let order = OrderRow {
        order_id: Uuid::new_v4().to_string(),
        customer_id: new_order.customer_id,
        email: new_order.email,
        address: new_order.address,
        product_id: new_order.product_id,
        quantity: new_order.quantity,
        payment_method: new_order.payment_method,
        order_date,
        order_amount: product.price * Decimal::from(new_order.quantity),
        status: OrderStatus::Processing.as_str().to_string(),
        status_version: INITIAL_STATUS_VERSION,
        delivery_date: Some(delivery_date_for(order_date)),
    };

    order_repo::insert(pool, &order).await?;

    tracing::info!(
        order_id = %order.order_id,
        customer_id = %order.customer_id,
        product_id = %order.product_id,
        "Order created"
    );

    Ok(order)
}

/// Apply a `status_changed` event to the local order record.
///
/// Duplicate event ids short-circuit before any side effect; older versions
/// land as [`ApplyOutcome::Stale`] and are still marked processed so a
/// redelivery does not loop.
pub async fn apply_status_change(
    pool: &PgPool,
    event_id: Uuid,
    order_id: &str,
    status: OrderStatus,
    delivery_date: Option<NaiveDate>,
    version: i64,
) -> OrderResult<ApplyOutcome> {
    if processed_repo::exists(pool, event_id).await? {
        return Err(OrderError::DuplicateEvent(event_id));
    }

    let mut tx = pool.begin().await?;

    let updated = order_repo::update_status_versioned(
        &mut tx,
        order_id,
        status.as_str(),
        delivery_date,
        version,
    )
    .await?;

    if updated == 0 && !order_repo::exists(&mut tx, order_id).await? {
        return Err(OrderError::NotFound(order_id.to_string()));
    }

    processed_repo::insert(&mut tx, event_id, "status_changed", PROCESSOR).await?;
    tx.commit().await?;

    if updated == 0 {
        tracing::debug!(
            order_id = %order_id,
            version,
            "Stale status event ignored"
        );
        return Ok(ApplyOutcome::Stale);
    }

    tracing::info!(
        order_id = %order_id,
        status = %status,
        version,
        "Order status updated from event"
    );
    Ok(ApplyOutcome::Applied)
}

/// Apply an `order_updated` event (quantity/shipping adjustments) under the
/// same version guard.
pub async fn apply_order_update(
    pool: &PgPool,
    event_id: Uuid,
    order_id: &str,
    quantity: Option<i32>,
    delivery_date: Option<NaiveDate>,
    version: i64,
) -> OrderResult<ApplyOutcome> {
    if processed_repo::exists(pool, event_id).await? {
        return Err(OrderError::DuplicateEvent(event_id));
    }

    let mut tx = pool.begin().await?;

    let updated =
        order_repo::update_details_versioned(&mut tx, order_id, quantity, delivery_date, version)
            .await?;

    if updated == 0 && !order_repo::exists(&mut tx, order_id).await? {
        return Err(OrderError::NotFound(order_id.to_string()));
    }

    processed_repo::insert(&mut tx, event_id, "order_updated", PROCESSOR).await?;
    tx.commit().await?;

    Ok(if updated == 0 {
        ApplyOutcome::Stale
    } else {
        ApplyOutcome::Applied
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_date_is_five_days_out() {
        let order_date = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        assert_eq!(
            delivery_date_for(order_date),
            NaiveDate::from_ymd_opt(2025, 11, 8).unwrap()
        );
    }
}
