use std::sync::Arc;

use giving_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    policy::RoutePolicyTable,
    session::{CredentialState, MemoryCredentialStore},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, the credential store, and the HTTP
/// server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration & environment loading (fail-fast).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter setup. RUST_LOG wins; otherwise sensible defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "giving_portal=debug,tower_http=info,axum=trace".into());

    // 3. Log format follows the environment: pretty locally, JSON in
    //    production for the log aggregator.
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

    tracing::info!("Session gateway starting in {:?} mode", config.env);

    // 4. Canonical credential store. One store, injected everywhere; the
    //    cookie copies are mirrors written by the login handlers.
    let store = Arc::new(MemoryCredentialStore::new()) as CredentialState;

    // 5. Outbound client for the upstream identity provider.
    let http = reqwest::Client::new();

    // 6. Unified state assembly.
    let routes = RoutePolicyTable::new(config.unmatched_policy);
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        store,
        http,
        config,
        routes,
    };

    // 7. Router and server startup.
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listen address");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
