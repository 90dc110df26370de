// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use futures::{StreamExt, future};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};

use crate::{
    llm::{LLMResult, UpstreamEvent, UpstreamStream},
    relay::state::{RelayInput, RelayState, transition},
    sse::Frame,
};

pub const DEFAULT_HEARTBEAT_SECS: u64 = 15;
pub const DEFAULT_MAX_STREAM_SECS: u64 = 300;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;

// Roughly 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

pub const PREMATURE_END_MESSAGE: &str = "upstream stream ended before completion";

/// Timing knobs for one relayed stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Period of `: ping` frames
    pub heartbeat_interval: Duration,
    /// Hard cap on the lifetime of one stream
    pub max_duration: Duration,
    /// Longest gap allowed between upstream events
    pub idle_timeout: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            max_duration: Duration::from_secs(DEFAULT_MAX_STREAM_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

/// Drive one relay from open to close.
///
/// `open` resolves to the upstream event stream. Frames are written to
/// `sink` in order; the receiving half is the response body. The heartbeat
/// timer lives inside this loop, so it stops on every return path.
///
/// Returns the terminal state that ended the loop.
pub async fn run_relay<F>(open: F, sink: mpsc::Sender<Frame>, settings: &RelaySettings) -> RelayState
where
    F: Future<Output = LLMResult<UpstreamStream>>,
{
    let started = Instant::now();
    let mut heartbeat = interval_at(
        instant_after(started, settings.heartbeat_interval),
        settings.heartbeat_interval,
    );
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = sleep_until(instant_after(started, settings.max_duration));
    let idle = sleep_until(instant_after(started, settings.idle_timeout));
    tokio::pin!(open, deadline, idle);

    let mut opening = true;
    let mut upstream: Option<UpstreamStream> = None;
    let mut state = RelayState::Idle;

    while !state.is_terminal() {
        let input = tokio::select! {
            biased;

            _ = sink.closed() => Some(RelayInput::Disconnected),
            _ = &mut deadline => Some(RelayInput::Failed(format!(
                "stream exceeded maximum duration of {}s",
                settings.max_duration.as_secs()
            ))),
            _ = &mut idle => Some(RelayInput::Failed(format!(
                "upstream idle for {}s",
                settings.idle_timeout.as_secs()
            ))),
            result = &mut open, if opening => {
                opening = false;
                idle.as_mut().reset(instant_after(Instant::now(), settings.idle_timeout));
                match result {
                    Ok(stream) => {
                        upstream = Some(stream);
                        Some(RelayInput::Opened)
                    }
                    Err(e) => Some(RelayInput::Failed(e.to_string())),
                }
            }
            item = next_upstream(&mut upstream) => {
                idle.as_mut().reset(instant_after(Instant::now(), settings.idle_timeout));
                match item {
                    Some(Ok(UpstreamEvent::TextDelta(text))) => Some(RelayInput::Delta(text)),
                    Some(Ok(UpstreamEvent::Completed)) => Some(RelayInput::Finished),
                    Some(Ok(UpstreamEvent::Other(kind))) => {
                        log::trace!("Ignoring upstream event {}", kind);
                        None
                    }
                    Some(Err(e)) => Some(RelayInput::Failed(e.to_string())),
                    None => Some(RelayInput::Failed(PREMATURE_END_MESSAGE.to_string())),
                }
            }
            _ = heartbeat.tick() => Some(RelayInput::Heartbeat),
        };

        let Some(input) = input else {
            continue;
        };
        if let RelayInput::Failed(message) = &input {
            log::warn!("Relay failing: {}", message);
        }

        let (next, frame) = transition(state, input);
        state = next;

        // A client that stops reading must not hold the relay past its deadline
        if let Some(frame) = frame {
            tokio::select! {
                biased;

                sent = sink.send(frame) => {
                    if let Err(e) = sent {
                        log::debug!("Dropping frame for disconnected client: {}", e);
                        state = transition(state, RelayInput::Disconnected).0;
                    }
                }
                _ = &mut deadline => {
                    log::warn!(
                        "Client stopped reading, closing after {}s",
                        settings.max_duration.as_secs()
                    );
                    state = transition(state, RelayInput::Disconnected).0;
                }
            }
        }
    }

    log::debug!(
        "Relay finished as {} after {}ms",
        state,
        started.elapsed().as_millis()
    );
    state
}

/// `start + after`, saturating far in the future instead of overflowing
fn instant_after(start: Instant, after: Duration) -> Instant {
    start
        .checked_add(after)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

async fn next_upstream(upstream: &mut Option<UpstreamStream>) -> Option<LLMResult<UpstreamEvent>> {
    match upstream {
        Some(stream) => stream.next().await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionProvider, ScriptStep, ScriptedProvider};

    fn settings(heartbeat: u64, max: u64, idle: u64) -> RelaySettings {
        RelaySettings {
            heartbeat_interval: Duration::from_secs(heartbeat),
            max_duration: Duration::from_secs(max),
            idle_timeout: Duration::from_secs(idle),
        }
    }

    async fn relay(provider: ScriptedProvider, settings: RelaySettings) -> (RelayState, Vec<Frame>) {
        let (tx, mut rx) = mpsc::channel(64);
        let state = run_relay(provider.stream("USER: hi"), tx, &settings).await;

        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }
        (state, frames)
    }

    #[test]
    fn test_default_settings() {
        let settings = RelaySettings::default();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(settings.max_duration, Duration::from_secs(300));
        assert_eq!(settings.idle_timeout, Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_between_deltas() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("Hel".into()),
            ScriptStep::Pause(Duration::from_secs(40)),
            ScriptStep::Delta("lo".into()),
            ScriptStep::Complete,
            ScriptStep::Delta("ignored".into()),
        ]);

        let (state, frames) = relay(provider, RelaySettings::default()).await;

        assert_eq!(state, RelayState::Completed);
        assert_eq!(
            frames,
            vec![
                Frame::Delta("Hel".into()),
                Frame::Heartbeat,
                Frame::Heartbeat,
                Frame::Delta("lo".into()),
                Frame::Done,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_while_opening() {
        let provider =
            ScriptedProvider::from_deltas(["hi"]).with_open_delay(Duration::from_secs(20));

        let (state, frames) = relay(provider, RelaySettings::default()).await;

        assert_eq!(state, RelayState::Completed);
        assert_eq!(
            frames,
            vec![Frame::Heartbeat, Frame::Delta("hi".into()), Frame::Done]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_error_is_terminal() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("partial".into()),
            ScriptStep::Fail("Rate limit reached".into()),
            ScriptStep::Complete,
        ]);

        let (state, frames) = relay(provider, RelaySettings::default()).await;

        assert_eq!(state, RelayState::Errored);
        assert_eq!(
            frames,
            vec![
                Frame::Delta("partial".into()),
                Frame::Error("Rate limit reached".into()),
            ]
        );
        assert!(!frames.contains(&Frame::Done));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_failure_becomes_error_frame() {
        let provider = ScriptedProvider::from_deltas(["never"]).failing_open(401, "bad key");

        let (state, frames) = relay(provider, RelaySettings::default()).await;

        assert_eq!(state, RelayState::Errored);
        assert_eq!(frames, vec![Frame::Error("API error: 401 - bad key".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ending_without_completion() {
        let provider = ScriptedProvider::new(vec![ScriptStep::Delta("a".into())]);

        let (state, frames) = relay(provider, RelaySettings::default()).await;

        assert_eq!(state, RelayState::Errored);
        assert_eq!(
            frames,
            vec![
                Frame::Delta("a".into()),
                Frame::Error(PREMATURE_END_MESSAGE.into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout() {
        let provider = ScriptedProvider::new(vec![ScriptStep::Delta("a".into()), ScriptStep::Hang]);

        let (state, frames) = relay(provider, settings(15, 300, 20)).await;

        assert_eq!(state, RelayState::Errored);
        assert_eq!(
            frames,
            vec![
                Frame::Delta("a".into()),
                Frame::Heartbeat,
                Frame::Error("upstream idle for 20s".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_duration() {
        let pause = || ScriptStep::Pause(Duration::from_secs(10));
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("a".into()),
            pause(),
            ScriptStep::Delta("b".into()),
            pause(),
            ScriptStep::Delta("c".into()),
            pause(),
            ScriptStep::Delta("d".into()),
            ScriptStep::Complete,
        ]);

        let (state, frames) = relay(provider, settings(100, 25, 20)).await;

        assert_eq!(state, RelayState::Errored);
        assert_eq!(
            frames,
            vec![
                Frame::Delta("a".into()),
                Frame::Delta("b".into()),
                Frame::Delta("c".into()),
                Frame::Error("stream exceeded maximum duration of 25s".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_reader_bounded_by_max_duration() {
        let mut steps: Vec<ScriptStep> = (0..10)
            .map(|i| ScriptStep::Delta(i.to_string()))
            .collect();
        steps.push(ScriptStep::Hang);
        let provider = ScriptedProvider::new(steps);
        let (tx, mut rx) = mpsc::channel(1);
        let started = Instant::now();

        // The receiver stays alive but is never read while the relay runs
        let state = tokio::time::timeout(
            Duration::from_secs(3600),
            run_relay(provider.stream("x"), tx, &settings(15, 25, 20)),
        )
        .await
        .expect("relay must stop at its deadline");

        assert_eq!(state, RelayState::Closed);
        assert_eq!(started.elapsed(), Duration::from_secs(25));
        assert_eq!(rx.recv().await, Some(Frame::Delta("0".into())));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_durations_do_not_overflow() {
        let provider = ScriptedProvider::from_deltas(["a"]);
        let settings = RelaySettings {
            heartbeat_interval: Duration::MAX,
            max_duration: Duration::MAX,
            idle_timeout: Duration::MAX,
        };

        let (state, frames) = relay(provider, settings).await;

        assert_eq!(state, RelayState::Completed);
        assert_eq!(frames, vec![Frame::Delta("a".into()), Frame::Done]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_gone_before_start() {
        let provider = ScriptedProvider::from_deltas(["a"]);
        let (tx, rx) = mpsc::channel(4);
        drop(rx);

        let state = run_relay(provider.stream("x"), tx, &RelaySettings::default()).await;
        assert_eq!(state, RelayState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_disconnect_mid_stream() {
        let provider = ScriptedProvider::new(vec![ScriptStep::Delta("a".into()), ScriptStep::Hang]);
        let (tx, mut rx) = mpsc::channel(4);

        let handle = tokio::spawn(async move {
            run_relay(provider.stream("x"), tx, &RelaySettings::default()).await
        });

        assert_eq!(rx.recv().await, Some(Frame::Delta("a".into())));
        drop(rx);

        assert_eq!(handle.await.unwrap(), RelayState::Closed);
    }
}
