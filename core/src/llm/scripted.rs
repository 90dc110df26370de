// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! Deterministic provider that replays a fixed script.
//!
//! Used by tests and for running the relay without network access.

use async_trait::async_trait;
use futures::{future, stream};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::llm::{
    CompletionProvider, LLMResult, UpstreamEvent, UpstreamStream, error::LLMError,
};

/// One scripted upstream action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Emit a text delta
    Delta(String),
    /// Wait before the next step
    Pause(Duration),
    /// Emit the completion event
    Complete,
    /// Emit an error event
    Fail(String),
    /// Never produce another event
    Hang,
}

#[derive(Debug, Clone)]
struct OpenFailure {
    status_code: u16,
    message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    steps: Vec<ScriptStep>,
    open_delay: Option<Duration>,
    open_failure: Option<OpenFailure>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    /// A script that streams each delta and then completes
    pub fn from_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut steps: Vec<ScriptStep> = deltas
            .into_iter()
            .map(|d| ScriptStep::Delta(d.into()))
            .collect();
        steps.push(ScriptStep::Complete);
        Self::new(steps)
    }

    /// Delay opening the stream
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Reject every request before any event is produced
    pub fn failing_open(mut self, status_code: u16, message: impl Into<String>) -> Self {
        self.open_failure = Some(OpenFailure {
            status_code,
            message: message.into(),
        });
        self
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    async fn open(&self, prompt: &str) -> LLMResult<()> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.open_failure {
            Some(failure) => Err(LLMError::ApiError {
                status_code: failure.status_code,
                message: failure.message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> LLMResult<String> {
        self.open(prompt).await?;

        let mut text = String::new();
        for step in &self.steps {
            match step {
                ScriptStep::Delta(delta) => text.push_str(delta),
                ScriptStep::Fail(message) => return Err(LLMError::StreamError(message.clone())),
                ScriptStep::Complete => break,
                ScriptStep::Pause(_) | ScriptStep::Hang => {}
            }
        }
        Ok(text)
    }

    async fn stream(&self, prompt: &str) -> LLMResult<UpstreamStream> {
        self.open(prompt).await?;

        let steps: VecDeque<ScriptStep> = self.steps.iter().cloned().collect();
        Ok(Box::pin(stream::unfold(steps, |mut steps| async move {
            loop {
                match steps.pop_front()? {
                    ScriptStep::Pause(duration) => tokio::time::sleep(duration).await,
                    ScriptStep::Hang => future::pending::<()>().await,
                    ScriptStep::Delta(text) => {
                        return Some((Ok(UpstreamEvent::TextDelta(text)), steps));
                    }
                    ScriptStep::Complete => return Some((Ok(UpstreamEvent::Completed), steps)),
                    ScriptStep::Fail(message) => {
                        return Some((Err(LLMError::StreamError(message)), steps));
                    }
                }
            }
        })))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_replays_script() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("a".into()),
            ScriptStep::Pause(Duration::from_millis(1)),
            ScriptStep::Fail("boom".into()),
        ]);
        let items: Vec<_> = provider.stream("USER: hi").await.unwrap().collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &UpstreamEvent::TextDelta("a".into()));
        assert_eq!(items[1].as_ref().unwrap_err().to_string(), "boom");
        assert_eq!(provider.prompts(), vec!["USER: hi".to_string()]);
    }

    #[tokio::test]
    async fn test_complete_concatenates_deltas() {
        let provider = ScriptedProvider::from_deltas(["Hel", "lo"]);
        assert_eq!(provider.complete("x").await.unwrap(), "Hello");

        let failing = ScriptedProvider::from_deltas(["x"]).failing_open(401, "bad key");
        let err = failing.complete("x").await.unwrap_err();
        assert_eq!(err.to_string(), "API error: 401 - bad key");
    }
}
