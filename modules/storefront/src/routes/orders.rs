//! Order intake and lookup endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::models::{CreateOrderRequest, OrderConfirmation, OrderView};
use crate::repos::order_repo;
use crate::routes::{ApiError, AppState};
use crate::services::order_service::{self, NewOrder, OrderError};

/// Handler for POST /orders
///
/// Commits the order locally, then publishes `order_created` fire-and-forget:
/// the 201 stands even when the broker is down.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderConfirmation>), ApiError> {
    if request.quantity <= 0 {
        return Err(ApiError::unprocessable("quantity must be positive"));
    }

    let order = order_service::create_order(
        &state.pool,
        NewOrder {
            customer_id: request.customer_id,
            email: request.email,
            address: request.address,
            product_id: request.product_id,
            quantity: request.quantity,
            payment_method: request.payment_method,
        },
    )
    .await
    .map_err(|e| match e {
        OrderError::UnknownProduct(id) => {
            ApiError::unprocessable(format!("unknown product: {id}"))
        }
        other => {
            tracing::error!(error = %other, "Order creation failed");
            ApiError::internal()
        }
    })?;

    state.publisher.publish_order_created(&order).await;

    Ok((
        StatusCode::CREATED,
        Json(OrderConfirmation {
            order_id: order.order_id,
            delivery_date: order.delivery_date,
            status: order.status,
        }),
    ))
}

/// Handler for GET /orders/{order_id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let order = order_repo::find(&state.pool, &order_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Order lookup failed");
            ApiError::internal()
        })?
        .ok_or_else(|| ApiError::not_found("order not found"))?;

    Ok(Json(order.into()))
}

/// Handler for GET /orders
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = order_repo::list_all(&state.pool).await.map_err(|e| {
        tracing::error!(error = %e, "Order listing failed");
        ApiError::internal()
    })?;

    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}
