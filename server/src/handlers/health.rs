// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use axum::Json;
use serde_json::{Value, json};

pub async fn handle_health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
