pub mod log_consumer;
