// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! Stream consumer: sends a transcript to the relay and folds the reply back in.

pub mod consumer;
pub mod reassembly;
pub mod transcript;

pub use consumer::{ChatClient, ConsumerError, Endpoints};
pub use reassembly::{Reassembler, StreamSignal};
pub use transcript::{ChatAction, ChatState, reduce};
