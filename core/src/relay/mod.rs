// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! Upstream-to-SSE relay: an explicit state machine and the task that drives it.

pub mod pump;
pub mod state;

pub use pump::{RelaySettings, run_relay};
pub use state::{RelayInput, RelayState, transition};
