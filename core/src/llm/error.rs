// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while talking to the upstream model or handling a chat request
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("API error: {status_code} - {message}")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("{0}")]
    StreamError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type LLMResult<T> = Result<T, LLMError>;
