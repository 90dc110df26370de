// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pocketchat_core::llm::LLMError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Upstream(#[from] LLMError),

    #[error("Use POST")]
    MethodNotAllowed,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "ok": false,
            "error": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
