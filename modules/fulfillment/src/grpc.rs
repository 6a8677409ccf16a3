//! gRPC surface of the fulfillment service.
//!
//! The transport layer stays thin: requests are validated, handed to the
//! order service, and outcomes mapped onto gRPC status codes. Every call is
//! mirrored to the interaction log without affecting its result.

use order_contracts::OrderStatus;
use sqlx::PgPool;
use std::sync::Arc;
use tonic::{Request, Response, Status};

use interaction_log::{InteractionLogger, InteractionStatus};

use crate::events::status_publisher::StatusPublisher;
use crate::proto::fulfillment_service_server::FulfillmentService;
use crate::proto::{
    GetProductStockRequest, GetProductStockResponse, ProcessOrderRequest, ProcessOrderResponse,
    UpdateOrderStatusRequest, UpdateOrderStatusResponse,
};
use crate::repos::product_repo;
use crate::services::order_service::{self, FulfillmentError, IncomingOrder};

pub struct FulfillmentGrpc {
    pool: PgPool,
    publisher: Arc<StatusPublisher>,
    logger: Arc<InteractionLogger>,
}

impl FulfillmentGrpc {
    pub fn new(
        pool: PgPool,
        publisher: Arc<StatusPublisher>,
        logger: Arc<InteractionLogger>,
    ) -> Self {
        Self {
            pool,
            publisher,
            logger,
        }
    }

    /// Accept the canonical status name or a legacy integer code.
    fn parse_status(raw: &str) -> Option<OrderStatus> {
        raw.parse::<OrderStatus>()
            .ok()
            .or_else(|| raw.parse::<i64>().ok().and_then(OrderStatus::from_code))
    }
}

#[tonic::async_trait]
impl FulfillmentService for FulfillmentGrpc {
    async fn process_order(
        &self,
        request: Request<ProcessOrderRequest>,
    ) -> Result<Response<ProcessOrderResponse>, Status> {
        let req = request.into_inner();

        tracing::info!(
            order_id = %req.order_id,
            product_id = %req.product_id,
            quantity = req.quantity,
            "ProcessOrder request"
        );

        if req.order_id.is_empty() {
            return Err(Status::invalid_argument("order_id is required"));
        }
        if req.quantity <= 0 {
            return Err(Status::invalid_argument("quantity must be positive"));
        }

        let incoming = IncomingOrder {
            order_id: req.order_id.clone(),
            customer_id: req.customer_id,
            product_id: req.product_id.clone(),
            quantity: req.quantity,
        };

        let result = order_service::process_order(&self.pool, incoming).await;

        let (interaction_status, error_message) = match &result {
            Ok(_) => (InteractionStatus::Success, None),
            Err(e) => (InteractionStatus::Error, Some(e.to_string())),
        };
        self.logger
            .log_detached(
                "storefront",
                "rpc",
                serde_json::json!({
                    "rpc": "ProcessOrder",
                    "order_id": &req.order_id,
                    "product_id": &req.product_id,
                    "quantity": req.quantity,
                }),
                interaction_status,
                error_message,
            );

        let processed = result.map_err(|e| match e {
            FulfillmentError::UnknownProduct(id) => {
                Status::not_found(format!("product {id} not found"))
            }
            other => {
                tracing::error!(error = %other, "ProcessOrder failed");
                Status::internal("order processing failed")
            }
        })?;

        if processed.newly_created {
            self.publisher
                .publish_status_changed_best_effort(
                    &processed.order_id,
                    processed.status,
                    processed.shipping_date,
                    processed.status_version,
                )
                .await;
        }

        if processed.status == OrderStatus::Cancelled {
            return Err(Status::failed_precondition(format!(
                "insufficient stock for product {}",
                req.product_id
            )));
        }

        Ok(Response::new(ProcessOrderResponse {
            order_id: processed.order_id,
            shipping_date: processed
                .shipping_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            order_status: processed.status.as_str().to_string(),
        }))
    }

    async fn update_order_status(
        &self,
        request: Request<UpdateOrderStatusRequest>,
    ) -> Result<Response<UpdateOrderStatusResponse>, Status> {
        let req = request.into_inner();

        tracing::info!(
            order_id = %req.order_id,
            status = %req.status,
            "UpdateOrderStatus request"
        );

        let status = Self::parse_status(&req.status)
            .ok_or_else(|| Status::invalid_argument(format!("unknown status: {}", req.status)))?;

        let updated = order_service::update_order_status(&self.pool, &req.order_id, status, None)
            .await
            .map_err(|e| match e {
                FulfillmentError::NotFound(id) => {
                    Status::not_found(format!("order {id} not found"))
                }
                other => {
                    tracing::error!(error = %other, "UpdateOrderStatus failed");
                    Status::internal("status update failed")
                }
            })?;

        // This RPC's contract surfaces a downstream publish failure.
        self.publisher
            .publish_status_changed(
                &updated.order_id,
                status,
                updated.shipping_date,
                updated.status_version,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Publish failed after status update");
                Status::internal("status updated but publish failed")
            })?;

        self.logger
            .log_detached(
                "storefront",
                "rpc",
                serde_json::json!({
                    "rpc": "UpdateOrderStatus",
                    "order_id": &req.order_id,
                    "status": status.as_str(),
                }),
                InteractionStatus::Success,
                None,
            );

        Ok(Response::new(UpdateOrderStatusResponse {
            acknowledged: true,
        }))
    }

    async fn get_product_stock(
        &self,
        request: Request<GetProductStockRequest>,
    ) -> Result<Response<GetProductStockResponse>, Status> {
        let req = request.into_inner();

        let product = product_repo::find(&self.pool, &req.product_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Product lookup failed");
                Status::internal("product lookup failed")
            })?
            .ok_or_else(|| Status::not_found(format!("product {} not found", req.product_id)))?;

        Ok(Response::new(GetProductStockResponse {
            product_id: product.product_id,
            product_name: product.product_name,
            stock_level: product.stock_level,
            retail_price: product.retail_price.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_accepts_name_and_code() {
        assert_eq!(
            FulfillmentGrpc::parse_status("Shipped"),
            Some(OrderStatus::Shipped)
        );
        assert_eq!(
            FulfillmentGrpc::parse_status("2"),
            Some(OrderStatus::Shipped)
        );
        assert_eq!(FulfillmentGrpc::parse_status("Delivered"), None);
        assert_eq!(FulfillmentGrpc::parse_status("9"), None);
    }
}
