// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use pocketchat_core::{config::RelayConfig, llm::CompletionProvider};
use std::sync::Arc;

/// State shared by every handler. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: RelayConfig) -> Self {
        Self {
            provider,
            config: Arc::new(config),
        }
    }
}
