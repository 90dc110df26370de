// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

pub mod error;
pub mod llm_basics;
pub mod llm_provider;
pub mod openai_client;
pub mod scripted;

pub use error::{LLMError, LLMResult};
pub use llm_basics::{UpstreamEvent, UpstreamStream};
pub use llm_provider::CompletionProvider;
pub use openai_client::OpenAIResponsesClient;
pub use scripted::{ScriptStep, ScriptedProvider};
