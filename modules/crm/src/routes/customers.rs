//! Customer registry endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

use crate::repos::{customer_repo, customer_repo::CustomerRow, order_repo};
use crate::routes::ApiError;
use crate::services::crm_service::{self, CrmError};

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub customer_id: String,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerOrderRequest {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub order_date: Option<NaiveDate>,
    pub order_amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct CustomerOrderView {
    pub order_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub order_date: Option<NaiveDate>,
    pub order_amount: Option<Decimal>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerWithOrders {
    pub customer_id: String,
    pub name: String,
    pub email: Option<String>,
    pub orders: Vec<CustomerOrderView>,
}

/// Handler for POST /customers
pub async fn create_customer(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    customer_repo::insert(
        &pool,
        &CustomerRow {
            customer_id: request.customer_id,
            name: request.name,
            email: request.email,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Customer creation failed");
        ApiError::internal()
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Customer created successfully" })),
    ))
}

/// Handler for POST /orders
pub async fn create_customer_order(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<CreateCustomerOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    crm_service::create_customer_order(
        &pool,
        request.order_id,
        request.customer_id,
        request.product_id,
        request.quantity,
        request.order_date,
        request.order_amount,
    )
    .await
    .map_err(|e| match e {
        CrmError::UnknownCustomer(id) => {
            ApiError::unprocessable(format!("unknown customer: {id}"))
        }
        other => {
            tracing::error!(error = %other, "Customer order creation failed");
            ApiError::internal()
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Order created successfully" })),
    ))
}

/// Handler for GET /customers
pub async fn list_customers_with_orders(
    State(pool): State<Arc<PgPool>>,
) -> Result<Json<Vec<CustomerWithOrders>>, ApiError> {
    let customers = customer_repo::list_all(&pool).await.map_err(|e| {
        tracing::error!(error = %e, "Customer listing failed");
        ApiError::internal()
    })?;

    let mut result = Vec::with_capacity(customers.len());
    for customer in customers {
        let orders = order_repo::list_for_customer(&pool, &customer.customer_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Order listing failed");
                ApiError::internal()
            })?
            .into_iter()
            .map(|o| CustomerOrderView {
                order_id: o.order_id,
                product_id: o.product_id,
                quantity: o.quantity,
                order_date: o.order_date,
                order_amount: o.order_amount,
                status: o.status,
            })
            .collect();

        result.push(CustomerWithOrders {
            customer_id: customer.customer_id,
            name: customer.name,
            email: customer.email,
            orders,
        });
    }

    Ok(Json(result))
}
