// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use pocketchat_core::{config::RelayConfig, llm::OpenAIResponsesClient};
use pocketchat_server::{AppState, run_server};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(
    name = "pocketchat-server",
    about = "PocketChat relay - streams model completions to chat clients",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8787")]
    bind: SocketAddr,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
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

    let config = RelayConfig::from_yaml_and_env(cli.config.as_deref())?;
    let provider = OpenAIResponsesClient::new(&config)?;
    log::info!(
        "Relaying to {} with model {} (CORS origin {})",
        config.base_url,
        provider.model(),
        config.cors_origin
    );

    let state = AppState::new(Arc::new(provider), config);
    run_server(state, cli.bind).await
}
