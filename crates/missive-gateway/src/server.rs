// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use missive_core::{Authenticator, MissiveError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::service::MessagingService;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: MessagingService,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(service: MessagingService) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

/// Gateway server configuration (mirrors GatewayConfig from missive-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the application router.
///
/// - GET /health (no auth)
/// - POST /, GET / (auth)
/// - GET, PATCH, DELETE /{id} (auth)
pub fn build_router(state: GatewayState, authenticator: Arc<dyn Authenticator>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/",
            post(handlers::send_message).get(handlers::sync_messages),
        )
        .route(
            "/{id}",
            get(handlers::get_message)
                .patch(handlers::modify_message)
                .delete(handlers::delete_message),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            AuthState { authenticator },
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve `app` on the configured address until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), MissiveError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MissiveError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| MissiveError::Gateway {
        message: format!("gateway server error: {e}"),
        source: Some(Box::new(e)),
    })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
