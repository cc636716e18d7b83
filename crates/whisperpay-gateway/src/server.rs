// SPDX-FileCopyrightText: 2026 Whisperpay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the payment API.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use whisperpay_config::ServerConfig;
use whisperpay_core::PaymentError;
use whisperpay_engine::{CallbackHandler, InitiationService};

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Purchase initiation service.
    pub initiation: Arc<InitiationService>,
    /// Bank callback processor.
    pub callback: Arc<CallbackHandler>,
}

/// Build the payment API router.
///
/// Routes:
/// - POST /v1/payments
/// - GET and POST /v1/payments/callback
/// - GET /health
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/payments", post(handlers::post_payment))
        .route(
            "/v1/payments/callback",
            get(handlers::get_callback).post(handlers::post_callback),
        )
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind to the configured address and serve the payment API.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), PaymentError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PaymentError::Internal(format!("failed to bind to {addr}: {e}")))?;

    tracing::info!("payment API listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| PaymentError::Internal(format!("server error: {e}")))?;

    Ok(())
}
