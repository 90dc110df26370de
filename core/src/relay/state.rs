// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::sse::Frame;

/// Lifecycle of one relayed stream.
///
/// `Idle -> Streaming -> (Completed | Errored) -> Closed`. A client
/// disconnect moves any state straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Headers sent, upstream not yet open
    Idle,
    /// Upstream open, deltas flowing
    Streaming,
    /// `[DONE]` written
    Completed,
    /// `[ERROR]` written
    Errored,
    /// Connection finished; nothing more is written
    Closed,
}

impl RelayState {
    /// Whether the terminal frame has been written or the connection is gone
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RelayState::Completed | RelayState::Errored | RelayState::Closed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelayState::Idle => "idle",
            RelayState::Streaming => "streaming",
            RelayState::Completed => "completed",
            RelayState::Errored => "errored",
            RelayState::Closed => "closed",
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something that happened to the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayInput {
    /// The upstream stream opened
    Opened,
    /// The upstream produced a text delta
    Delta(String),
    /// The heartbeat timer fired
    Heartbeat,
    /// The upstream completed
    Finished,
    /// The upstream, the handler or a timeout failed
    Failed(String),
    /// The client went away or a write failed
    Disconnected,
}

/// The single transition function of the relay.
///
/// Returns the next state and the frame to write, if any. Once a terminal
/// state is reached no input produces another frame.
pub fn transition(state: RelayState, input: RelayInput) -> (RelayState, Option<Frame>) {
    use RelayInput as I;
    use RelayState as S;

    match (state, input) {
        (S::Completed | S::Errored | S::Closed, I::Disconnected) => (S::Closed, None),
        (S::Completed | S::Errored | S::Closed, _) => (state, None),

        (_, I::Disconnected) => (S::Closed, None),
        (_, I::Heartbeat) => (state, Some(Frame::Heartbeat)),
        (_, I::Failed(message)) => (S::Errored, Some(Frame::Error(message))),
        (_, I::Finished) => (S::Completed, Some(Frame::Done)),
        (_, I::Delta(text)) => (S::Streaming, Some(Frame::Delta(text))),
        (S::Idle, I::Opened) => (S::Streaming, None),
        (S::Streaming, I::Opened) => (S::Streaming, None),
    }
}
