// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

pub mod chat_basics;
pub mod prompt;

pub use chat_basics::{ChatTurn, RawTurn, Role};
pub use prompt::{build_prompt, parse_messages};
