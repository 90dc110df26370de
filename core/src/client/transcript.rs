// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use crate::chat::{ChatTurn, Role};

/// Everything the chat screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    pub turns: Vec<ChatTurn>,
    /// A request is in flight; further submissions are ignored
    pub streaming: bool,
    /// Blocking message for the user, if any
    pub alert: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Append a user turn and an empty assistant placeholder
    Submit(String),
    /// Replace the text of the trailing assistant turn
    ReplaceAssistant(String),
    Complete,
    Fail(String),
    DismissAlert,
}

impl ChatState {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![ChatTurn::system(system_prompt)],
            streaming: false,
            alert: None,
        }
    }

    /// Text of the trailing assistant turn
    pub fn assistant_text(&self) -> Option<&str> {
        self.turns
            .last()
            .filter(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content.as_str())
    }
}

pub fn reduce(state: &ChatState, action: ChatAction) -> ChatState {
    let mut next = state.clone();

    match action {
        ChatAction::Submit(input) => {
            let content = input.trim();
            if content.is_empty() || state.streaming {
                return next;
            }
            next.turns.push(ChatTurn::user(content));
            next.turns.push(ChatTurn::assistant(""));
            next.streaming = true;
            next.alert = None;
        }
        ChatAction::ReplaceAssistant(text) => {
            if let Some(last) = next.turns.last_mut() {
                if last.role == Role::Assistant {
                    last.content = text;
                }
            }
        }
        ChatAction::Complete => next.streaming = false,
        ChatAction::Fail(message) => {
            next.streaming = false;
            next.alert = Some(message);
        }
        ChatAction::DismissAlert => next.alert = None,
    }

    next
}
