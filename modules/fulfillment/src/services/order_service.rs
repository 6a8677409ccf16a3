//! Order acceptance against the stock ledger.
//!
//! Acceptance and stock decrement are one transaction: the product row is
//! locked, availability checked, stock decremented, and the order inserted
//! before a single commit. Insufficient stock is not an error; the order is
//! recorded as Cancelled with stock untouched.

use chrono::{Duration, NaiveDate, Utc};
use order_contracts::OrderStatus;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::repos::{order_repo, order_repo::OrderRow, processed_repo, product_repo};

/// Version stamped on an order that went straight from created to its
/// acceptance outcome (created counts as the first version).
pub const ACCEPTED_STATUS_VERSION: i64 = 2;

const PROCESSOR: &str = "fulfillment-consumer";

#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error("product {0} not found")]
    UnknownProduct(String),

    #[error("order {0} not found")]
    NotFound(String),

    #[error("event already processed (duplicate): {0}")]
    DuplicateEvent(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

/// Input for order acceptance, from the RPC surface or an order_created
/// event.
#[derive(Debug, Clone)]
pub struct IncomingOrder {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
}

/// Outcome of order acceptance.
#[derive(Debug, Clone)]
pub struct ProcessedOrder {
    pub order_id: String,
    pub status: OrderStatus,
    pub shipping_date: Option<NaiveDate>,
    pub status_version: i64,
    /// False when the order already existed and nothing was changed.
    pub newly_created: bool,
}

/// Shipping date quoted for an accepted order.
pub fn shipping_date_for(accepted_on: NaiveDate) -> NaiveDate {
    accepted_on + Duration::days(3)
}

async fn process_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    incoming: &IncomingOrder,
) -> FulfillmentResult<ProcessedOrder> {
    let product = product_repo::find_for_update(tx, &incoming.product_id)
        .await?
        .ok_or_else(|| FulfillmentError::UnknownProduct(incoming.product_id.clone()))?;

    // Reprocessing an already-known order returns its recorded outcome.
    if let Some(existing) = order_repo::find_tx(tx, &incoming.order_id).await? {
        let status = existing
            .order_status
            .parse::<OrderStatus>()
            .unwrap_or(OrderStatus::Processing);
        return Ok(ProcessedOrder {
            order_id: existing.order_id,
            status,
            shipping_date: existing.shipping_date,
            status_version: existing.status_version,
            newly_created: false,
        });
    }

    let (status, shipping_date) = if product.stock_level < incoming.quantity {
        tracing::warn!(
            order_id = %incoming.order_id,
            product_id = %incoming.product_id,
            requested = incoming.quantity,
            available = product.stock_level,
            "Insufficient stock, cancelling order"
        );
        (OrderStatus::Cancelled, None)
    } else {
        product_repo::decrement_stock(tx, &incoming.product_id, incoming.quantity).await?;
        (
            OrderStatus::Processed,
            Some(shipping_date_for(Utc::now().date_naive())),
        )
    };

    let order = OrderRow {
        order_id: incoming.order_id.clone(),
        customer_id: incoming.customer_id.clone(),
        product_id: incoming.product_id.clone(),
        quantity: incoming.quantity,
        order_status: status.as_str().to_string(),
        status_version: ACCEPTED_STATUS_VERSION,
        shipping_date,
    };
    order_repo::insert(tx, &order).await?;

    Ok(ProcessedOrder {
        order_id: order.order_id,
        status,
        shipping_date,
        status_version: ACCEPTED_STATUS_VERSION,
        newly_created: true,
    })
}

/// Accept an order arriving over the RPC surface.
pub async fn process_order(
    pool: &PgPool,
    incoming: IncomingOrder,
) -> FulfillmentResult<ProcessedOrder> {
    let mut tx = pool.begin().await?;
    let processed = process_order_tx(&mut tx, &incoming).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %processed.order_id,
        status = %processed.status,
        newly_created = processed.newly_created,
        "Order processed"
    );

    Ok(processed)
}

/// Accept an order arriving as an `order_created` event, with event-level
/// deduplication in the same transaction as the stock movement.
pub async fn apply_order_created(
    pool: &PgPool,
    event_id: Uuid,
    incoming: IncomingOrder,
) -> FulfillmentResult<ProcessedOrder> {
    if processed_repo::exists(pool, event_id).await? {
        return Err(FulfillmentError::DuplicateEvent(event_id));
    }

    let mut tx = pool.begin().await?;
    let processed = process_order_tx(&mut tx, &incoming).await?;
    processed_repo::insert(&mut tx, event_id, "order_created", PROCESSOR).await?;
    tx.commit().await?;

    tracing::info!(
        event_id = %event_id,
        order_id = %processed.order_id,
        status = %processed.status,
        "Order event applied"
    );

    Ok(processed)
}

/// Transition an existing order to a new status (RPC surface). Returns the
/// updated row with its bumped version.
pub async fn update_order_status(
    pool: &PgPool,
    order_id: &str,
    status: OrderStatus,
    shipping_date: Option<NaiveDate>,
) -> FulfillmentResult<OrderRow> {
    let updated = order_repo::transition_status(pool, order_id, status.as_str(), shipping_date)
        .await?
        .ok_or_else(|| FulfillmentError::NotFound(order_id.to_string()))?;

    tracing::info!(
        order_id = %order_id,
        status = %status,
        version = updated.status_version,
        "Order status transitioned"
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_date_is_three_days_out() {
        let accepted = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        assert_eq!(
            shipping_date_for(accepted),
            NaiveDate::from_ymd_opt(2025, 11, 6).unwrap()
        );
    }
}
