// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use futures::StreamExt;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::{
    chat::ChatTurn,
    client::{
        reassembly::{Reassembler, StreamSignal},
        transcript::{ChatAction, ChatState, reduce},
    },
    llm::{LLMError, LLMResult},
    sse::EVENT_STREAM_CONTENT_TYPE,
};

/// Why a send did not finish with `[DONE]` or a JSON answer
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Server(String),

    #[error("stream closed before completion")]
    Closed,
}

/// Relay endpoints derived from one base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub chat: Url,
    pub chat_json: Url,
    pub health: Url,
}

impl Endpoints {
    pub fn from_base(base: &str) -> LLMResult<Self> {
        let mut base = Url::parse(base)
            .map_err(|e| LLMError::ConfigError(format!("invalid base URL {}: {}", base, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let join = |path: &str| {
            base.join(path)
                .map_err(|e| LLMError::ConfigError(format!("invalid endpoint {}: {}", path, e)))
        };

        Ok(Self {
            chat: join("api/chat")?,
            chat_json: join("api/chat-json")?,
            health: join("api/health")?,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatTurn],
}

#[derive(Deserialize, Default)]
struct JsonReply {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

enum StreamEnd {
    Done,
    Failed(String),
}

/// HTTP side of the stream consumer
pub struct ChatClient {
    client: Client,
    endpoints: Endpoints,
}

impl ChatClient {
    pub fn new(base_url: &str) -> LLMResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LLMError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            endpoints: Endpoints::from_base(base_url)?,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Submit `input` and stream the reply into a new transcript.
    ///
    /// `observer` sees every intermediate state, starting with the one that
    /// holds the empty assistant placeholder. Failures never escape: they end
    /// up in `alert`, with whatever partial text arrived left in place.
    pub async fn send(
        &self,
        state: &ChatState,
        input: &str,
        observer: &mut dyn FnMut(&ChatState),
    ) -> ChatState {
        let mut current = reduce(state, ChatAction::Submit(input.to_string()));
        if current.turns.len() == state.turns.len() {
            return current;
        }
        observer(&current);

        // Everything up to and including the new user turn
        let sent = current.turns[..current.turns.len() - 1].to_vec();
        let request = ChatRequest { messages: &sent };

        let action = match self.exchange(&mut current, &request, observer).await {
            Ok(StreamEnd::Done) => ChatAction::Complete,
            Ok(StreamEnd::Failed(payload)) => ChatAction::Fail(payload),
            Err(e) => {
                log::warn!("Chat request failed: {}", e);
                ChatAction::Fail(format!("Request failed: {}", e))
            }
        };

        current = reduce(&current, action);
        observer(&current);
        current
    }

    /// Whether the relay answers `{ok:true}` on its health endpoint
    pub async fn health(&self) -> LLMResult<bool> {
        let response = self.client.get(self.endpoints.health.clone()).send().await?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let reply: JsonReply = response.json().await?;
        Ok(reply.ok)
    }

    async fn exchange(
        &self,
        current: &mut ChatState,
        request: &ChatRequest<'_>,
        observer: &mut dyn FnMut(&ChatState),
    ) -> Result<StreamEnd, ConsumerError> {
        let response = self
            .client
            .post(self.endpoints.chat.clone())
            .json(request)
            .send()
            .await?;

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(EVENT_STREAM_CONTENT_TYPE));

        if !response.status().is_success() || !is_event_stream {
            log::debug!(
                "Stream endpoint answered {} without an event stream, using JSON",
                response.status()
            );
            return self.fallback(current, request).await;
        }

        let mut body = response.bytes_stream();
        let mut reassembler = Reassembler::new();
        while let Some(chunk) = body.next().await {
            let signals = reassembler.feed(&chunk?);
            if let Some(end) = apply_signals(current, signals, observer) {
                return Ok(end);
            }
        }

        let signals = reassembler.finish();
        apply_signals(current, signals, observer).ok_or(ConsumerError::Closed)
    }

    async fn fallback(
        &self,
        current: &mut ChatState,
        request: &ChatRequest<'_>,
    ) -> Result<StreamEnd, ConsumerError> {
        let response = self
            .client
            .post(self.endpoints.chat_json.clone())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConsumerError::Status(response.status()));
        }

        let reply: JsonReply = response.json().await?;
        if !reply.ok {
            let message = reply
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Server error".to_string());
            return Err(ConsumerError::Server(message));
        }

        *current = reduce(
            current,
            ChatAction::ReplaceAssistant(reply.text.unwrap_or_default()),
        );
        Ok(StreamEnd::Done)
    }
}

fn apply_signals(
    current: &mut ChatState,
    signals: Vec<StreamSignal>,
    observer: &mut dyn FnMut(&ChatState),
) -> Option<StreamEnd> {
    for signal in signals {
        match signal {
            StreamSignal::Progress(text) => {
                *current = reduce(current, ChatAction::ReplaceAssistant(text));
                observer(current);
            }
            StreamSignal::Done => return Some(StreamEnd::Done),
            StreamSignal::Failed(payload) => return Some(StreamEnd::Failed(payload)),
        }
    }
    None
}
