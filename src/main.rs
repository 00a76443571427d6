use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use tenantdesk::config::AppConfig;
use tenantdesk::handlers;
use tenantdesk::services::backend::http::HttpBookingBackend;
use tenantdesk::services::customers::CustomerDirectory;
use tenantdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    tracing::info!("bookings backend: {}", config.backend_base_url);
    if config.backend_token.is_empty() {
        tracing::warn!("BACKEND_TOKEN not set; backend requests will be unauthenticated");
    }

    let backend = HttpBookingBackend::new(
        config.backend_base_url.clone(),
        config.backend_token.clone(),
    );

    let (events_tx, _) = broadcast::channel(256);

    let directory = CustomerDirectory::new(
        Box::new(backend),
        Duration::from_millis(config.settle_delay_ms),
        events_tx.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        directory,
        events_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/app", get(handlers::customers::dashboard_page))
        .route("/api/customers", get(handlers::customers::get_customers))
        .route(
            "/api/customers/summary",
            get(handlers::customers::get_summary),
        )
        .route(
            "/api/customers/:id/checkout",
            post(handlers::customers::check_out_customer),
        )
        .route(
            "/api/customers/:id/hide",
            post(handlers::customers::hide_customer),
        )
        .route(
            "/api/customers/events",
            get(handlers::customers::events_stream),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
