// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

//! Relay demonstration
//!
//! Drives the relay with a scripted upstream, prints the SSE wire output and
//! feeds the same bytes through the consumer-side reassembler.

use pocketchat_core::{
    Frame, Reassembler, RelaySettings, ScriptStep, ScriptedProvider, StreamSignal,
    llm::CompletionProvider, run_relay,
};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    println!("🔧 Relaying a scripted upstream");
    println!("===============================");

    let provider = ScriptedProvider::new(vec![
        ScriptStep::Delta("Hel".into()),
        ScriptStep::Pause(Duration::from_millis(1200)),
        ScriptStep::Delta("lo".into()),
        ScriptStep::Delta(" world".into()),
        ScriptStep::Complete,
    ]);
    let settings = RelaySettings {
        heartbeat_interval: Duration::from_millis(500),
        ..RelaySettings::default()
    };

    let (tx, mut rx) = mpsc::channel::<Frame>(32);
    let relay = tokio::spawn(async move {
        run_relay(provider.stream("USER: hi"), tx, &settings).await
    });

    let mut wire = String::new();
    while let Some(frame) = rx.recv().await {
        print!("{}", frame.encode());
        wire.push_str(&frame.encode());
    }
    match relay.await {
        Ok(state) => println!("🏁 Relay finished: {}", state),
        Err(e) => println!("❌ Relay task failed: {}", e),
    }

    println!("\n📊 Reassembled on the consumer side:");
    let mut reassembler = Reassembler::new();
    // Odd-sized chunks to show that frame boundaries do not matter
    for chunk in wire.as_bytes().chunks(7) {
        for signal in reassembler.feed(chunk) {
            match signal {
                StreamSignal::Progress(text) => println!("📦 {:?}", text),
                StreamSignal::Done => println!("✅ done"),
                StreamSignal::Failed(payload) => println!("❌ {}", payload),
            }
        }
    }
}
