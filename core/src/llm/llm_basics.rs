// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use futures::Stream;
use std::{fmt, pin::Pin};

use crate::llm::error::LLMResult;

/// Event yielded by an upstream streaming completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// An incremental fragment of generated text
    TextDelta(String),
    /// The response finished normally
    Completed,
    /// Any other event type; the relay ignores these
    Other(String),
}

impl fmt::Display for UpstreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamEvent::TextDelta(text) => write!(f, "text_delta({:?})", text),
            UpstreamEvent::Completed => write!(f, "completed"),
            UpstreamEvent::Other(kind) => write!(f, "other({})", kind),
        }
    }
}

/// Type alias for an upstream event stream.
///
/// An `Err` item is the upstream error event and ends the stream as far as
/// the relay is concerned.
pub type UpstreamStream = Pin<Box<dyn Stream<Item = LLMResult<UpstreamEvent>> + Send>>;
