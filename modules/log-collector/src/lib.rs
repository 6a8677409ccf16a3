pub mod config;
pub mod consumer;
pub mod db;
pub mod health;
pub mod repos;
pub mod routes;

pub use consumer::log_consumer::start_log_consumer;

/// Logical name of this service.
pub const SERVICE_NAME: &str = "log-collector";
