// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! The consumer against a relay bound to a real socket.

use axum::{
    Json, Router,
    http::{StatusCode, header},
    routing::post,
};
use pocketchat_core::{
    client::{ChatClient, ChatState},
    config::RelayConfig,
    llm::{ScriptStep, ScriptedProvider},
};
use pocketchat_server::{AppState, create_router};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn relay(provider: &ScriptedProvider) -> ChatClient {
    let state = AppState::new(
        Arc::new(provider.clone()),
        RelayConfig::new("sk-test".to_string()),
    );
    let addr = serve(create_router(state)).await;
    ChatClient::new(&format!("http://{}", addr)).unwrap()
}

async fn custom(app: Router) -> ChatClient {
    let addr = serve(app).await;
    ChatClient::new(&format!("http://{}", addr)).unwrap()
}

/// Send `input` and return the final state plus every assistant text observed
async fn send(client: &ChatClient, state: &ChatState, input: &str) -> (ChatState, Vec<String>) {
    let mut seen = Vec::new();
    let mut observer = |s: &ChatState| seen.push(s.assistant_text().unwrap_or_default().to_string());
    let next = client.send(state, input, &mut observer).await;
    (next, seen)
}

#[tokio::test]
async fn streamed_reply_accumulates() {
    let provider = ScriptedProvider::from_deltas(["Hel", "lo", " world"]);
    let client = relay(&provider).await;

    let (state, seen) = send(&client, &ChatState::new("sys"), "  hi ").await;

    assert_eq!(state.assistant_text(), Some("Hello world"));
    assert!(!state.streaming);
    assert_eq!(state.alert, None);
    assert_eq!(seen, vec!["", "Hel", "Hello", "Hello world", "Hello world"]);
    assert_eq!(provider.prompts(), vec!["SYSTEM: sys\nUSER: hi".to_string()]);
}

#[tokio::test]
async fn second_turn_sends_full_history() {
    let provider = ScriptedProvider::from_deltas(["ok"]);
    let client = relay(&provider).await;

    let (state, _) = send(&client, &ChatState::new("sys"), "one").await;
    let (state, _) = send(&client, &state, "two").await;

    assert_eq!(state.turns.len(), 5);
    assert_eq!(
        provider.prompts().last().unwrap(),
        "SYSTEM: sys\nUSER: one\nASSISTANT: ok\nUSER: two"
    );
}

#[tokio::test]
async fn error_frame_becomes_alert() {
    let provider = ScriptedProvider::new(vec![
        ScriptStep::Delta("partial".into()),
        ScriptStep::Fail("quota exceeded".into()),
    ]);
    let client = relay(&provider).await;

    let (state, _) = send(&client, &ChatState::new("sys"), "hi").await;

    assert_eq!(state.assistant_text(), Some("partial"));
    assert_eq!(state.alert.as_deref(), Some("[ERROR] quota exceeded"));
    assert!(!state.streaming);
}

#[tokio::test]
async fn health_check() {
    let client = relay(&ScriptedProvider::default()).await;
    assert!(client.health().await.unwrap());
}

#[tokio::test]
async fn falls_back_to_json_without_event_stream() {
    let client = custom(
        Router::new()
            .route("/api/chat", post(|| async { Json(json!({ "ok": true })) }))
            .route(
                "/api/chat-json",
                post(|| async { Json(json!({ "ok": true, "text": "X" })) }),
            ),
    )
    .await;

    let (state, seen) = send(&client, &ChatState::new("sys"), "hi").await;

    assert_eq!(state.assistant_text(), Some("X"));
    assert_eq!(state.alert, None);
    assert_eq!(seen, vec!["", "X"]);
}

#[tokio::test]
async fn fallback_http_error_is_reported() {
    let client = custom(Router::new().route(
        "/api/chat-json",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": "quota" })),
            )
        }),
    ))
    .await;

    let (state, _) = send(&client, &ChatState::new("sys"), "hi").await;

    assert_eq!(
        state.alert.as_deref(),
        Some("Request failed: HTTP 500 Internal Server Error")
    );
    assert_eq!(state.assistant_text(), Some(""));
}

#[tokio::test]
async fn fallback_server_error_is_reported() {
    let client = custom(Router::new().route(
        "/api/chat-json",
        post(|| async { Json(json!({ "ok": false })) }),
    ))
    .await;

    let (state, _) = send(&client, &ChatState::new("sys"), "hi").await;

    assert_eq!(state.alert.as_deref(), Some("Request failed: Server error"));
}

#[tokio::test]
async fn premature_close_is_a_failure() {
    let client = custom(Router::new().route(
        "/api/chat",
        post(|| async {
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                ": ping\n\ndata: Hel\n\n",
            )
        }),
    ))
    .await;

    let (state, _) = send(&client, &ChatState::new("sys"), "hi").await;

    assert_eq!(state.assistant_text(), Some("Hel"));
    assert_eq!(
        state.alert.as_deref(),
        Some("Request failed: stream closed before completion")
    );
}

#[tokio::test]
async fn unreachable_relay_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ChatClient::new(&format!("http://{}", addr)).unwrap();

    let (state, _) = send(&client, &ChatState::new("sys"), "hi").await;

    assert!(!state.streaming);
    assert!(state.alert.unwrap().starts_with("Request failed: "));
}
