//! Catalog endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{CreateProductRequest, ProductView};
use crate::repos::product_repo::{self, ProductRow};
use crate::routes::{ApiError, AppState};

/// Handler for POST /products
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    product_repo::insert(
        &state.pool,
        &ProductRow {
            product_id: request.product_id,
            product_name: request.product_name,
            category: request.category,
            price: request.price,
            stock_quantity: request.stock_quantity,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Product creation failed");
        ApiError::internal()
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Product created successfully" })),
    ))
}

/// Handler for GET /products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let products = product_repo::list_all(&state.pool).await.map_err(|e| {
        tracing::error!(error = %e, "Product listing failed");
        ApiError::internal()
    })?;

    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}
