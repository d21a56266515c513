use edu_portal::{
    AppState,
    backend::{BackendState, HttpBackend},
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, the backend client and the HTTP
/// server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production settings)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter, RUST_LOG wins over the default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "edu_portal=debug,tower_http=info".into());

    // 3. Pretty logs locally, JSON in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);
    tracing::info!(backend = %config.backend_url, graphql = %config.graphql_url, "backend endpoints");

    // 4. Backend client
    let backend = Arc::new(
        HttpBackend::new(&config).expect("FATAL: Failed to build the backend HTTP client."),
    ) as BackendState;

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { backend, config });

    // 5. Server
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app).await.expect("FATAL: HTTP server stopped.");
}
