// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Health,
    Reset,
    Quit,
    Help,
    /// Unrecognised `/command`
    Unknown(String),
    Message(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Command::Empty,
            "/health" => Command::Health,
            "/reset" => Command::Reset,
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            _ if line.starts_with('/') => Command::Unknown(line.to_string()),
            _ => Command::Message(line.to_string()),
        }
    }
}

/// The part of `current` not yet printed.
///
/// The consumer always reports the full text so far. When it extends what
/// was printed, only the new tail is returned; otherwise the whole text is.
pub fn render_suffix<'a>(previous: &str, current: &'a str) -> &'a str {
    current.strip_prefix(previous).unwrap_or(current)
}

/// `~/.config/pocketchat/config.yaml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pocketchat").join("config.yaml"))
}
