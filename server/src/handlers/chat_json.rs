// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use axum::{Json, body::Bytes, extract::State};
use pocketchat_core::{
    chat::{build_prompt, parse_messages},
    llm::LLMError,
};
use serde_json::{Value, json};

use crate::{error::ServerError, state::AppState};

/// Single-shot completion: `{ok:true,text}` or a 500 `{ok:false,error}`.
///
/// Bounded by the same maximum duration as a streamed reply.
pub async fn handle_chat_json(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ServerError> {
    let turns = parse_messages(&body)?;
    let prompt = build_prompt(&turns);

    let limit = state.config.max_stream_duration;
    let text = tokio::time::timeout(limit, state.provider.complete(&prompt))
        .await
        .unwrap_or_else(|_| {
            Err(LLMError::TimeoutError(format!(
                "completion exceeded {}s",
                limit.as_secs()
            )))
        })
        .inspect_err(|e| log::warn!("JSON completion failed: {}", e))?;

    log::info!(
        "JSON completion via {}: {} turns, {} chars",
        state.provider.provider_name(),
        turns.len(),
        text.len()
    );
    Ok(Json(json!({ "ok": true, "text": text })))
}
