// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-lived subscription to the backend's credential event stream.
//!
//! One task per process. Reconnects with exponential backoff, sending
//! `Last-Event-ID` so the backend can replay what was published while the
//! stream was down. Pending registrations survive a reconnect. A connection
//! that stays silent past the idle timeout is treated as lost.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::credential::channel::{CredentialChannel, Delivery};
use crate::credential::parse_credential_event;
use crate::credential::sse::SseDecoder;

/// Connection settings for the credential stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub idle_timeout: Duration,
}

impl StreamConfig {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

enum Disconnect {
    Cancelled,
    Lost(String),
}

/// Spawn the stream consumer. It runs until `shutdown` is cancelled.
pub fn spawn_credential_stream(
    channel: Arc<CredentialChannel>,
    config: StreamConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<JoinHandle<()>> {
    // No overall timeout: the response body is open-ended.
    let client = reqwest::Client::builder().build()?;

    Ok(tokio::spawn(async move {
        let mut backoff = config.initial_backoff;
        let mut decoder = SseDecoder::new();

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let mut req = client.get(&config.url).header("Accept", "text/event-stream");
            if let Some(ref key) = config.api_key {
                req = req.bearer_auth(key);
            }
            if let Some(id) = decoder.last_event_id().filter(|id| !id.is_empty()) {
                req = req.header("Last-Event-ID", id);
            }

            let connect = tokio::select! {
                _ = shutdown.cancelled() => break,
                resp = req.send() => resp.and_then(|r| r.error_for_status()),
            };

            match connect {
                Ok(resp) => {
                    backoff = config.initial_backoff;
                    decoder.reset();
                    channel.set_connected(true);
                    tracing::info!(url = %config.url, "credential stream connected");

                    let outcome =
                        consume(&channel, &mut decoder, resp, config.idle_timeout, &shutdown).await;
                    channel.set_connected(false);
                    match outcome {
                        Disconnect::Cancelled => break,
                        Disconnect::Lost(reason) => {
                            tracing::warn!(
                                url = %config.url,
                                %reason,
                                pending = channel.pending(),
                                "credential stream disconnected"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(url = %config.url, err = %e, "credential stream connect failed");
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(config.max_backoff);
        }

        channel.set_connected(false);
        tracing::debug!("credential stream stopped");
    }))
}

async fn consume(
    channel: &CredentialChannel,
    decoder: &mut SseDecoder,
    resp: reqwest::Response,
    idle_timeout: Duration,
    shutdown: &CancellationToken,
) -> Disconnect {
    let mut body = resp.bytes_stream();
    loop {
        let chunk = tokio::select! {
            _ = shutdown.cancelled() => return Disconnect::Cancelled,
            chunk = tokio::time::timeout(idle_timeout, body.next()) => chunk,
        };
        let bytes = match chunk {
            Ok(Some(Ok(bytes))) => bytes,
            Ok(Some(Err(e))) => return Disconnect::Lost(e.to_string()),
            Ok(None) => return Disconnect::Lost("stream ended".to_owned()),
            Err(_) => {
                return Disconnect::Lost(format!("idle for {}ms", idle_timeout.as_millis()))
            }
        };

        for frame in decoder.feed(&bytes) {
            let Some(event) = parse_credential_event(&frame.data) else {
                tracing::debug!(event = ?frame.event, "ignoring non-credential stream event");
                continue;
            };
            if channel.deliver(event) == Delivery::Unmatched {
                tracing::trace!("credential event had no waiter");
            }
        }
    }
}
