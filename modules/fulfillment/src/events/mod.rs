pub mod status_publisher;
