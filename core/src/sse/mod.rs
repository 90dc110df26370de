// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! Server-sent event framing shared by the relay and the consumer.

pub mod decoder;
pub mod frame;
pub mod parser;

pub use decoder::Utf8StreamDecoder;
pub use frame::{DONE_SENTINEL, ERROR_PREFIX, Frame, Payload};
pub use parser::{SseEvent, SseParser};

/// Content type announced by an event-stream response
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";
