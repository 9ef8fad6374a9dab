//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tannoy_core::config::GatewayConfig;
use tannoy_core::types::ChannelKind;
use tannoy_engine::NotificationEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    /// The notification engine — rules, event queue, dispatch, stats.
    pub engine: Arc<NotificationEngine>,
    /// Channels the delivery router can actually reach.
    pub channels: Vec<ChannelKind>,
    pub start_time: std::time::Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(super::routes::health_check))
        .route("/api/v1/events", post(super::routes::ingest_event))
        .route("/api/v1/rules", get(super::routes::list_rules))
        .route("/api/v1/rules", post(super::routes::create_rule))
        .route("/api/v1/rules/{id}", put(super::routes::update_rule))
        .route(
            "/api/v1/rules/{id}",
            axum::routing::delete(super::routes::delete_rule),
        )
        .route(
            "/api/v1/rules/{id}/toggle",
            post(super::routes::toggle_rule),
        )
        .route("/api/v1/stats", get(super::routes::get_stats))
        .route(
            "/api/v1/notifications",
            get(super::routes::recent_notifications),
        )
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .max_age(std::time::Duration::from_secs(3600));

            // Restrict CORS origins in production via env var
            // Example: TANNOY_CORS_ORIGINS=https://ops.example.com
            if let Ok(origins_str) = std::env::var("TANNOY_CORS_ORIGINS") {
                let origins: Vec<_> = origins_str
                    .split(',')
                    .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            } else {
                cors.allow_origin(Any)
            }
        })
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Bind and serve until Ctrl-C. Returns once in-flight requests have
/// settled; the caller still owns engine shutdown.
pub async fn start(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("⏹️ Shutdown signal received");
        })
        .await?;
    Ok(())
}
