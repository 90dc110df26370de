// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! HTTP relay that streams upstream completions to chat clients.

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::ServerError;
pub use server::{create_router, run_server};
pub use state::AppState;
