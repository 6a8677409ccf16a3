//! Request/response bodies for the storefront HTTP API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::repos::order_repo::OrderRow;
use crate::repos::product_repo::ProductRow;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub email: String,
    pub address: String,
    pub product_id: String,
    pub quantity: i32,
    pub payment_method: String,
}

/// Slim confirmation returned right after order creation.
#[derive(Debug, Serialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub delivery_date: Option<NaiveDate>,
    pub status: String,
}

/// Full order view for lookups and listings.
#[derive(Debug, Serialize)]
pub struct OrderView {
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
    pub delivery_date: Option<NaiveDate>,
}

impl From<OrderRow> for OrderView {
    fn from(row: OrderRow) -> Self {
        Self {
            order_id: row.order_id,
            customer_id: row.customer_id,
            email: row.email,
            address: row.address,
            product_id: row.product_id,
            quantity: row.quantity,
            payment_method: row.payment_method,
            order_date: row.order_date,
            order_amount: row.order_amount,
            status: row.status,
            delivery_date: row.delivery_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

impl From<ProductRow> for ProductView {
    fn from(row: ProductRow) -> Self {
        Self {
            product_id: row.product_id,
            product_name: row.product_name,
            category: row.category,
            price: row.price,
            stock_quantity: row.stock_quantity,
        }
    }
}
