use axum::routing::{get, post};
use axum::Router;
use event_bus::{connect_with_retry, EventBus, InMemoryBus, NatsBus};
use interaction_log::InteractionLogger;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use crm_rs::{
    config::Config,
    health::health,
    routes::customers::{create_customer, create_customer_order, list_customers_with_orders},
    start_order_consumer, SERVICE_NAME,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting CRM service...");

    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        "Configuration loaded: port={}, bus_type={}",
        config.port,
        config.bus_type
    );

    tracing::info!("Connecting to database...");
    let pool = crm_rs::db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

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

    start_order_consumer(bus.clone(), pool.clone(), logger).await;

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/customers", post(create_customer).get(list_customers_with_orders))
        .route("/orders", post(create_customer_order))
        .with_state(Arc::new(pool.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("CRM service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");

    tracing::info!("CRM service shut down");
}

/// Resolve on SIGINT or SIGTERM so in-flight requests can drain.
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
