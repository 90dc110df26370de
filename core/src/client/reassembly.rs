// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use crate::sse::{Payload, SseEvent, SseParser, Utf8StreamDecoder};

/// What a chunk of relay output means for the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    /// Accumulated assistant text so far
    Progress(String),
    Done,
    /// Full `[ERROR] ...` payload
    Failed(String),
}

/// Rebuilds the assistant reply from raw relay bytes.
#[derive(Debug, Default)]
pub struct Reassembler {
    decoder: Utf8StreamDecoder,
    parser: SseParser,
    accumulated: String,
    finished: bool,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamSignal> {
        if self.finished {
            return Vec::new();
        }
        let text = self.decoder.decode(chunk);
        let events = self.parser.feed(&text);
        self.apply(events)
    }

    /// Flush whatever is buffered once the body has ended
    pub fn finish(&mut self) -> Vec<StreamSignal> {
        if self.finished {
            return Vec::new();
        }
        let tail = self.decoder.finish();
        let mut events = self.parser.feed(&tail);
        events.extend(self.parser.finish());
        self.apply(events)
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// A `[DONE]` or `[ERROR]` payload has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn apply(&mut self, events: Vec<SseEvent>) -> Vec<StreamSignal> {
        let mut signals = Vec::new();
        for event in events {
            match Payload::classify(&event.data) {
                Payload::Done => {
                    self.finished = true;
                    signals.push(StreamSignal::Done);
                }
                Payload::Error(payload) => {
                    self.finished = true;
                    signals.push(StreamSignal::Failed(payload.to_string()));
                }
                Payload::Text(text) => {
                    self.accumulated.push_str(text);
                    signals.push(StreamSignal::Progress(self.accumulated.clone()));
                }
            }
            if self.finished {
                break;
            }
        }
        signals
    }
}
