pub mod config;
pub mod consumer;
pub mod db;
pub mod dlq;
pub mod events;
pub mod health;
pub mod models;
pub mod repos;
pub mod routes;
pub mod services;

pub use consumer::status_consumer::start_status_consumer;
pub use events::publisher::OrderEventPublisher;

/// Logical name of this service in envelopes and interaction logs.
pub const SERVICE_NAME: &str = "storefront";
