// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use std::fmt;

/// Payload marking normal completion of a stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Prefix of the payload that ends a stream with an error
pub const ERROR_PREFIX: &str = "[ERROR]";

/// Wire-level unit sent from the relay to the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `: ping` comment that keeps idle connections open
    Heartbeat,
    /// A fragment of generated text
    Delta(String),
    /// Normal completion sentinel
    Done,
    /// Error sentinel carrying the failure message
    Error(String),
}

impl Frame {
    /// Whether this frame ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Frame::Done | Frame::Error(_))
    }

    /// Serialize the frame to its wire form.
    ///
    /// Text containing newlines is split over several `data:` lines, which a
    /// conforming parser joins back with `\n`.
    pub fn encode(&self) -> String {
        match self {
            Frame::Heartbeat => ": ping\n\n".to_string(),
            Frame::Delta(text) => encode_data(text),
            Frame::Done => encode_data(DONE_SENTINEL),
            Frame::Error(message) => encode_data(&format!("{} {}", ERROR_PREFIX, message)),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Heartbeat => write!(f, "heartbeat"),
            Frame::Delta(text) => write!(f, "delta({} bytes)", text.len()),
            Frame::Done => write!(f, "done"),
            Frame::Error(message) => write!(f, "error({})", message),
        }
    }
}

fn encode_data(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for line in text.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Meaning of a received `data` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Done,
    /// The full payload, including the `[ERROR]` prefix
    Error(&'a str),
    Text(&'a str),
}

impl<'a> Payload<'a> {
    pub fn classify(data: &'a str) -> Self {
        if data == DONE_SENTINEL {
            Payload::Done
        } else if data.starts_with(ERROR_PREFIX) {
            Payload::Error(data)
        } else {
            Payload::Text(data)
        }
    }
}
