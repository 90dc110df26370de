// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

pub mod chat;
pub mod client;
pub mod config;
pub mod llm;
pub mod relay;
pub mod sse;

pub use chat::*;
pub use client::*;
pub use config::*;
pub use llm::*;
pub use relay::*;
pub use sse::*;
