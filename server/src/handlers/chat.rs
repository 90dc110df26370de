// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! Streaming chat endpoint.
//!
//! The response head goes out immediately; the relay task then writes SSE
//! frames into a channel whose receiving half is the response body. When the
//! client goes away the body is dropped and the relay sees its sink close.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use pocketchat_core::{
    chat::{build_prompt, parse_messages},
    llm::{CompletionProvider, LLMResult, UpstreamStream},
    relay::run_relay,
    sse::Frame,
};
use std::{convert::Infallible, sync::Arc};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::state::AppState;

pub const SSE_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

const FRAME_BUFFER: usize = 32;

pub async fn handle_chat_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let (tx, rx) = mpsc::channel::<Frame>(FRAME_BUFFER);
    let provider = state.provider.clone();
    let settings = state.config.relay_settings();

    tokio::spawn(async move {
        let outcome = run_relay(open_upstream(provider, body), tx, &settings).await;
        log::info!("Chat stream ended: {}", outcome);
    });

    let frames = ReceiverStream::new(rx).map(|frame| Ok::<_, Infallible>(frame.encode()));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, SSE_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

/// Parse the request and open the upstream stream. Any failure here
/// surfaces to the client as an `[ERROR]` frame.
async fn open_upstream(
    provider: Arc<dyn CompletionProvider>,
    body: Bytes,
) -> LLMResult<UpstreamStream> {
    let turns = parse_messages(&body)?;
    let prompt = build_prompt(&turns);
    log::debug!(
        "Opening {} stream for {} turns",
        provider.provider_name(),
        turns.len()
    );
    provider.stream(&prompt).await
}
