pub mod failed_repo;
pub mod order_repo;
pub mod processed_repo;
pub mod product_repo;
