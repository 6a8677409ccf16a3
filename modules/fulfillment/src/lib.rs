pub mod config;
pub mod consumer;
pub mod db;
pub mod dlq;
pub mod events;
pub mod grpc;
pub mod repos;
pub mod seed;
pub mod services;

/// Generated gRPC types for `fulfillment.v1` (see `build.rs`).
pub mod proto {
    include!("generated/fulfillment.v1.rs");
}

pub use consumer::order_consumer::start_order_consumer;
pub use events::status_publisher::StatusPublisher;

/// Logical name of this service in envelopes and interaction logs.
pub const SERVICE_NAME: &str = "fulfillment";
