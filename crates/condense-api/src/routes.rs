//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, the request
//! body limit, and the rate limiter on the summarization routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use condense_core::error::CondenseError;

use crate::handlers;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    // The browser frontend may be served from anywhere.
    let cors = CorsLayer::permissive();

    let public_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/summaries", get(handlers::list_summaries))
        .route("/api/summaries/{filename}", get(handlers::get_summary))
        .route("/api/files/{filename}", get(handlers::get_file));

    let mut summarize_routes = Router::new()
        .route("/api/summarize", post(handlers::summarize))
        .route("/api/upload", post(handlers::upload));

    // 0 disables rate limiting.
    if server.rate_limit_per_sec > 0 {
        let limiter = RateLimiter::new(server.rate_limit_per_sec);
        summarize_routes = summarize_routes
            .layer(axum::middleware::from_fn(
                crate::rate_limit::rate_limit_middleware,
            ))
            .layer(axum::Extension(limiter));
    }

    let body_limit = server.max_upload_bytes;

    public_routes
        .merge(summarize_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve the API until shutdown.
pub async fn start_server(state: AppState) -> Result<(), CondenseError> {
    let server = &state.config.server;
    let addr = format!("{}:{}", server.host, server.port);
    let next_port = server.port.saturating_add(1);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind - is another instance running?");
            tracing::error!("Try: CONDENSE_PORT={} condense", next_port);
            return Err(CondenseError::Api(format!("Failed to bind {}: {}", addr, e)));
        }
    };

    let router = create_router(state);
    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router)
        .await
        .map_err(|e| CondenseError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
