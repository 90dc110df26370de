// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use pocketchat_cli::{Command, default_config_path, render_suffix};
use pocketchat_core::{
    client::{ChatAction, ChatClient, ChatState, reduce},
    config::ClientConfig,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "pocketchat",
    about = "PocketChat - chat with a model through a PocketChat relay",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Relay base URL (overrides config and POCKETCHAT_API_BASE)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// System prompt for new conversations
    #[arg(short, long)]
    system: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn show_welcome_message(base_url: &str) {
    println!();
    println!("💬 {} - streaming chat client", "PocketChat".bright_cyan());
    println!("💡 Version: {}", env!("CARGO_PKG_VERSION").bright_green());
    println!("🔗 Relay: {}", base_url.bright_blue());
    println!("Type a message, or /health, /reset, /quit.");
    println!();
}

fn prompt() -> Result<()> {
    print!("{} ", "you>".bright_green());
    std::io::stdout().flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let config_path = cli.config.or_else(default_config_path);
    let mut config = ClientConfig::from_yaml_and_env(config_path.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(system) = cli.system {
        config.system_prompt = system;
    }

    let client = ChatClient::new(&config.base_url)?;
    show_welcome_message(&config.base_url);

    let mut state = ChatState::new(&config.system_prompt);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("Commands: /health, /reset, /quit"),
            Command::Reset => {
                state = ChatState::new(&config.system_prompt);
                println!("{}", "Conversation cleared.".dimmed());
            }
            Command::Health => match client.health().await {
                Ok(true) => println!("✅ Relay is healthy"),
                Ok(false) => println!("{}", "⚠️ Relay answered but is not healthy".yellow()),
                Err(e) => eprintln!("{}", format!("❌ Health check failed: {}", e).red()),
            },
            Command::Unknown(command) => {
                eprintln!("{}", format!("Unknown command: {}", command).yellow());
            }
            Command::Message(text) => {
                print!("{} ", "assistant>".bright_cyan());
                let mut shown = String::new();
                let mut observer = |s: &ChatState| {
                    if let Some(reply) = s.assistant_text() {
                        print!("{}", render_suffix(&shown, reply));
                        let _ = std::io::stdout().flush();
                        shown = reply.to_string();
                    }
                };
                state = client.send(&state, &text, &mut observer).await;
                println!();

                if let Some(alert) = &state.alert {
                    eprintln!("{}", alert.red());
                    state = reduce(&state, ChatAction::DismissAlert);
                }
            }
        }
    }

    Ok(())
}
