// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

pub mod chat;
pub mod chat_json;
pub mod health;

use axum::http::StatusCode;

use crate::error::ServerError;

/// CORS preflight: 200 with an empty body
pub async fn handle_preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn handle_method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
