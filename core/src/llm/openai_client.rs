// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use futures::{Stream, StreamExt, stream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use crate::{
    config::RelayConfig,
    llm::{
        LLMResult, UpstreamEvent, UpstreamStream, error::LLMError,
        llm_provider::CompletionProvider,
    },
    sse::{SseEvent, SseParser, Utf8StreamDecoder},
};

#[derive(Debug, Clone, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Option<Vec<OutputItem>>,
    #[serde(default)]
    error: Option<ResponsesErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Option<Vec<OutputContent>>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsesErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsesStreamEvent {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
    #[serde(default)]
    delta: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Option<ResponsesBody>,
}

impl ResponsesBody {
    /// The aggregated output text, or an empty string when there is none
    fn into_text(self) -> String {
        if let Some(text) = self.output_text {
            return text;
        }
        self.output
            .unwrap_or_default()
            .into_iter()
            .flat_map(|item| item.content.unwrap_or_default())
            .filter(|content| content.content_type == "output_text")
            .filter_map(|content| content.text)
            .collect()
    }
}

/// Client for the OpenAI Responses API
pub struct OpenAIResponsesClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIResponsesClient {
    pub fn new(config: &RelayConfig) -> LLMResult<Self> {
        if config.api_key.is_empty() {
            return Err(LLMError::ConfigError("API key is required".to_string()));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LLMError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post(&self, prompt: &str, streaming: bool) -> LLMResult<reqwest::Response> {
        let url = format!("{}/responses", self.base_url);
        let request = ResponsesRequest {
            model: &self.model,
            input: prompt,
            stream: streaming.then_some(true),
        };

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request);
        if streaming {
            builder = builder.header(reqwest::header::ACCEPT, "text/event-stream");
        }

        let response = builder.send().await.map_err(LLMError::HttpError)?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::ApiError {
                status_code,
                message: error_text,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for OpenAIResponsesClient {
    async fn complete(&self, prompt: &str) -> LLMResult<String> {
        let response = self.post(prompt, false).await?;
        let body: ResponsesBody = response.json().await.map_err(LLMError::HttpError)?;
        Ok(body.into_text())
    }

    async fn stream(&self, prompt: &str) -> LLMResult<UpstreamStream> {
        let response = self.post(prompt, true).await?;
        Ok(decode_event_stream(Box::pin(response.bytes_stream())))
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: Utf8StreamDecoder,
    parser: SseParser,
    queued: VecDeque<LLMResult<UpstreamEvent>>,
    exhausted: bool,
}

/// Turn a raw upstream SSE byte stream into upstream events.
pub fn decode_event_stream<S, B, E>(bytes: S) -> UpstreamStream
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<LLMError> + Send + 'static,
{
    let state = DecodeState {
        bytes,
        decoder: Utf8StreamDecoder::new(),
        parser: SseParser::new(),
        queued: VecDeque::new(),
        exhausted: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.queued.pop_front() {
                return Some((item, st));
            }
            if st.exhausted {
                return None;
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let text = st.decoder.decode(chunk.as_ref());
                    for event in st.parser.feed(&text) {
                        st.queued.push_back(parse_stream_event(&event));
                    }
                }
                Some(Err(e)) => {
                    st.exhausted = true;
                    st.queued.push_back(Err(e.into()));
                }
                None => {
                    st.exhausted = true;
                    let tail = st.decoder.finish();
                    let mut events = st.parser.feed(&tail);
                    events.extend(st.parser.finish());
                    for event in events {
                        st.queued.push_back(parse_stream_event(&event));
                    }
                }
            }
        }
    }))
}

fn parse_stream_event(event: &SseEvent) -> LLMResult<UpstreamEvent> {
    let parsed: ResponsesStreamEvent = match serde_json::from_str(&event.data) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Skipping unparseable upstream event: {}", e);
            return Ok(UpstreamEvent::Other(event.event.clone().unwrap_or_default()));
        }
    };

    let kind = parsed
        .event_type
        .or_else(|| event.event.clone())
        .unwrap_or_default();

    match kind.as_str() {
        "response.output_text.delta" => Ok(UpstreamEvent::TextDelta(
            parsed.delta.unwrap_or_default(),
        )),
        "response.completed" => Ok(UpstreamEvent::Completed),
        "error" => Err(LLMError::StreamError(
            parsed.message.unwrap_or_else(|| "upstream error".to_string()),
        )),
        "response.failed" => Err(LLMError::StreamError(
            parsed
                .response
                .and_then(|r| r.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "response failed".to_string()),
        )),
        _ => Ok(UpstreamEvent::Other(kind)),
    }
}
