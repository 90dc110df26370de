// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! Request body parsing and prompt flattening.
//!
//! The upstream model receives one prompt string, built from the turn list as
//! `"ROLE: content"` lines. The transform is lossy: turn boundaries cannot be
//! recovered when a turn's content contains a newline.

use serde_json::Value;

use crate::chat::RawTurn;
use crate::llm::error::{LLMError, LLMResult};

/// Extract the `messages` array from a request body.
///
/// An empty or unparseable body, or one without `messages`, yields an empty
/// list. A `messages` value that is not an array is rejected.
pub fn parse_messages(body: &[u8]) -> LLMResult<Vec<RawTurn>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let doc: Value = match serde_json::from_slice(body) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("Ignoring unparseable request body: {}", e);
            return Ok(Vec::new());
        }
    };

    match doc.get("messages") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().cloned().map(RawTurn).collect()),
        Some(_) => Err(LLMError::InvalidRequest(
            "messages must be an array".to_string(),
        )),
    }
}

/// Flatten turns into the single prompt string sent upstream.
pub fn build_prompt(turns: &[RawTurn]) -> String {
    turns
        .iter()
        .map(|turn| {
            format!(
                "{}: {}",
                render_field(turn.role()).to_uppercase(),
                render_field(turn.content())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_field(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatTurn, Role};

    fn raw(turns: &[ChatTurn]) -> Vec<RawTurn> {
        turns.iter().map(RawTurn::from).collect()
    }

    #[test]
    fn test_prompt_has_one_line_per_turn_in_order() {
        let turns = vec![
            ChatTurn::system("You are a helpful mobile assistant."),
            ChatTurn::user("What is Rust?"),
            ChatTurn::assistant("A systems language."),
            ChatTurn::user("Thanks"),
        ];
        let prompt = build_prompt(&raw(&turns));

        let lines: Vec<&str> = prompt.split('\n').collect();
        assert_eq!(lines.len(), turns.len());
        for (line, turn) in lines.iter().zip(&turns) {
            let (role, content) = line.split_once(": ").unwrap();
            assert_eq!(Role::from_str(role).unwrap(), turn.role);
            assert_eq!(role, turn.role.as_str().to_uppercase());
            assert_eq!(content, turn.content);
        }
    }

    #[test]
    fn test_empty_turn_list_gives_empty_prompt() {
        assert_eq!(build_prompt(&[]), "");
    }

    #[test]
    fn test_malformed_turns_render_literally() {
        let body = br#"{"messages":[{}, {"role":null,"content":3}, "loose", {"role":"user"}]}"#;
        let turns = parse_messages(body).unwrap();
        assert_eq!(
            build_prompt(&turns),
            "UNDEFINED: undefined\nNULL: 3\nUNDEFINED: undefined\nUSER: undefined"
        );
    }

    #[test]
    fn test_parse_messages_defaults_to_empty() {
        assert!(parse_messages(b"").unwrap().is_empty());
        assert!(parse_messages(b"{}").unwrap().is_empty());
        assert!(parse_messages(b"not json").unwrap().is_empty());
        assert!(parse_messages(br#"{"messages":null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_messages_rejects_non_array() {
        let err = parse_messages(br#"{"messages":"hello"}"#).unwrap_err();
        assert!(err.to_string().contains("messages must be an array"));
    }
}
