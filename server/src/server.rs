// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{any, post},
};
use std::net::SocketAddr;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{handlers, state::AppState};

pub const CORS_ALLOW_HEADERS: &str = "content-type,authorization";
pub const CORS_ALLOW_METHODS: &str = "POST,OPTIONS";

fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/chat",
            post(handlers::chat::handle_chat_stream)
                .options(handlers::handle_preflight)
                .fallback(handlers::handle_method_not_allowed),
        )
        .route(
            "/chat-json",
            post(handlers::chat_json::handle_chat_json)
                .options(handlers::handle_preflight)
                .fallback(handlers::handle_method_not_allowed),
        )
        .route("/health", any(handlers::health::handle_health))
}

/// Build the router. Routes are served both at the root and under `/api`.
pub fn create_router(state: AppState) -> Router {
    let origin = HeaderValue::from_str(&state.config.cors_origin).unwrap_or_else(|_| {
        log::warn!(
            "Invalid CORS origin {:?}, falling back to *",
            state.config.cors_origin
        );
        HeaderValue::from_static("*")
    });

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            origin,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
