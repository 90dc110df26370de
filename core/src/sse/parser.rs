// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

/// A dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if present
    pub event: Option<String>,
    /// The `data:` lines joined with `\n`
    pub data: String,
}

/// Line-oriented SSE parser that buffers partial lines across chunks.
///
/// Comment lines (heartbeats) and blocks without `data:` lines never produce
/// an event.
#[derive(Debug, Default)]
pub struct SseParser {
    line_buffer: String,
    data_lines: Vec<String>,
    event_type: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed decoded text. Returns the events completed by it.
    pub fn feed(&mut self, text: &str) -> Vec<SseEvent> {
        self.line_buffer.push_str(text);

        let mut events = Vec::new();
        while let Some(end) = self.line_buffer.find('\n') {
            let raw: String = self.line_buffer.drain(..=end).collect();
            let line = raw.trim_end_matches('\n');
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush at end of stream: an unterminated trailing event is still
    /// dispatched.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.line_buffer);
        let line = rest.strip_suffix('\r').unwrap_or(&rest);
        if !line.is_empty() {
            self.process_line(line);
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.event_type = Some(value.to_string()),
            // id: and retry: carry nothing we use
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event_type.take();
        if self.data_lines.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data_lines).join("\n");
        Some(SseEvent { event, data })
    }
}
