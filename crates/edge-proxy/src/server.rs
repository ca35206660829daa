//! Axum HTTP server: router, listener, graceful shutdown.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::proxy::forward::Forwarder;
use crate::proxy::request_id;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ProxyConfig,
    pub forwarder: Forwarder,
}

/// Build the router: a local health check, everything under the prefix forwarded.
pub fn router(state: AppState) -> Router {
    let cors = state.config.server.cors;

    let mut app = Router::new()
        .route("/health", get(handle_health))
        .fallback(handle_forward)
        .with_state(Arc::new(state));

    if cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http())
}

/// Build and run the HTTP server.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let listen_addr = state.config.server.listen_address.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "Edge proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Edge proxy shut down gracefully");
    Ok(())
}

/// Catch-all handler: forwards any method under the prefix to the backend.
async fn handle_forward(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let request_id = request_id::generate_id();

    if !state.forwarder.routes(request.uri()) {
        tracing::debug!(path = %request.uri().path(), "Path outside routing prefix");
        let body = json!({
            "success": false,
            "error": "Not Found",
            "message": format!("only paths under {} are forwarded", state.config.forward.prefix),
        });
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.config.server.max_body_bytes).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, request_id = %request_id, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "failed to read request body").into_response();
        }
    };

    let spec = state
        .forwarder
        .spec_for(parts.method, &parts.uri, parts.headers, body);

    state.forwarder.handle(spec, &request_id).await
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, draining connections...");
}
