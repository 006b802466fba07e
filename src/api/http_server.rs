// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use super::Dispatcher;
use crate::crypto::SIGNATURE_HEADER;
use crate::version;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Flow data exchange endpoint + banner
        .route("/", post(flow_handler).get(banner_handler))
        // Health check
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(
    listen_addr: &str,
    dispatcher: Dispatcher,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_app(AppState::new(dispatcher));

    let addr = listen_addr.parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server is listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("⏹️  Shutting down...");
}

/// Body is taken as raw bytes: the signature covers the exact wire bytes, so
/// it must be checked before any JSON parsing.
async fn flow_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.dispatcher.handle(&body, signature).await {
        Ok(encrypted) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            encrypted,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn banner_handler() -> Html<&'static str> {
    Html("<pre>Flow Endpoint\nRefer to documentation for usage.</pre>")
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version::VERSION_NUMBER.to_string(),
    })
}
