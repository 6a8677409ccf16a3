use event_bus::{connect_with_retry, EventBus, InMemoryBus, NatsBus};
use interaction_log::InteractionLogger;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tracing_subscriber::EnvFilter;

use fulfillment_rs::{
    config::Config,
    grpc::FulfillmentGrpc,
    proto::fulfillment_service_server::FulfillmentServiceServer,
    start_order_consumer, StatusPublisher, SERVICE_NAME,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting fulfillment service...");

    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        "Configuration loaded: grpc_port={}, bus_type={}",
        config.grpc_port,
        config.bus_type
    );

    tracing::info!("Connecting to database...");
    let pool = fulfillment_rs::db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    fulfillment_rs::seed::seed_demo_products(&pool)
        .await
        .expect("Failed to seed demo products");

    let bus: Arc<dyn EventBus> = match config.bus_type.to_lowercase().as_str() {
        "inmemory" => {
            tracing::info!("Using InMemory event bus");
            Arc::new(InMemoryBus::new())
        }
        "nats" => {
            tracing::info!("Connecting to NATS at {}", config.nats_url);
            let client = connect_with_retry(&config.nats_url).await;
            Arc::new(NatsBus::new(client))
        }
        _ => panic!(
            "Invalid BUS_TYPE: {}. Must be 'inmemory' or 'nats'",
            config.bus_type
        ),
    };

    let mut logger = InteractionLogger::new(SERVICE_NAME).with_bus(bus.clone());
    if let Some(url) = &config.log_collector_url {
        logger = logger.with_collector_url(url);
    }
    if let Some(path) = &config.log_fallback_path {
        logger = logger.with_fallback_path(path.into());
    }
    let logger = Arc::new(logger);

    let publisher = Arc::new(StatusPublisher::new(bus.clone(), logger.clone()));

    start_order_consumer(
        bus.clone(),
        pool.clone(),
        publisher.clone(),
        logger.clone(),
    )
    .await;

    let service = FulfillmentGrpc::new(pool.clone(), publisher, logger);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.grpc_port));
    tracing::info!("Fulfillment gRPC server listening on {}", addr);

    // Stops accepting new calls on signal; in-flight calls complete.
    Server::builder()
        .add_service(FulfillmentServiceServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .expect("gRPC server failed");

    tracing::info!("Fulfillment service shut down");
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
