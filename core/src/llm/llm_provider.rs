// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::llm::{UpstreamStream, error::LLMResult};

/// Base trait for upstream completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run a prompt to completion and return the generated text
    async fn complete(&self, prompt: &str) -> LLMResult<String>;

    /// Open a streaming completion for a prompt
    async fn stream(&self, prompt: &str) -> LLMResult<UpstreamStream>;

    /// Get the provider name for this client
    fn provider_name(&self) -> &str;
}
