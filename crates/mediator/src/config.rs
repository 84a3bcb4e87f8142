// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

/// Mediator between client applications and an EDC consumer connector.
#[derive(Debug, Clone, Parser)]
#[command(name = "edc-mediator", version, about)]
pub struct MediatorConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "EDC_MEDIATOR_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "EDC_MEDIATOR_PORT")]
    pub port: u16,

    /// Base URL of the local connector's management API.
    #[arg(
        long,
        default_value = "http://localhost:29193/management",
        env = "EDC_MEDIATOR_MANAGEMENT_URL"
    )]
    pub management_url: String,

    /// API key sent to the management API. If unset, no key header is sent.
    #[arg(long, env = "EDC_MEDIATOR_MANAGEMENT_API_KEY")]
    pub management_api_key: Option<String>,

    /// Header carrying the management API key.
    #[arg(long, default_value = "X-Api-Key", env = "EDC_MEDIATOR_MANAGEMENT_API_KEY_HEADER")]
    pub management_api_key_header: String,

    /// Base URL of the consumer backend publishing pull credentials.
    #[arg(long, default_value = "http://localhost:28000", env = "EDC_MEDIATOR_BACKEND_URL")]
    pub backend_url: String,

    /// Path of the backend's Server-Sent Events stream.
    #[arg(long, default_value = "/pull/stream", env = "EDC_MEDIATOR_BACKEND_STREAM_PATH")]
    pub backend_stream_path: String,

    /// Bearer token for the backend stream.
    #[arg(long, env = "EDC_MEDIATOR_BACKEND_API_KEY")]
    pub backend_api_key: Option<String>,

    /// Reconnect the credential stream after this long without any bytes, in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "EDC_MEDIATOR_STREAM_IDLE_TIMEOUT_MS")]
    pub stream_idle_timeout_ms: u64,

    /// Interval between connector state polls in milliseconds.
    #[arg(long, default_value_t = 1000, env = "EDC_MEDIATOR_POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Negotiation step deadline in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "EDC_MEDIATOR_NEGOTIATION_TIMEOUT_MS")]
    pub negotiation_timeout_ms: u64,

    /// Transfer step deadline in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "EDC_MEDIATOR_TRANSFER_TIMEOUT_MS")]
    pub transfer_timeout_ms: u64,

    /// Credential wait deadline in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "EDC_MEDIATOR_CREDENTIAL_TIMEOUT_MS")]
    pub credential_timeout_ms: u64,

    /// Overall workflow deadline in milliseconds. Defaults to the sum of the step deadlines.
    #[arg(long, env = "EDC_MEDIATOR_WORKFLOW_TIMEOUT_MS")]
    pub workflow_timeout_ms: Option<u64>,

    /// Consecutive failed polls tolerated before giving up on the connector.
    #[arg(long, default_value_t = 3, env = "EDC_MEDIATOR_UPSTREAM_RETRIES")]
    pub upstream_retries: u32,

    /// Transfer type requested from the connector.
    #[arg(long, default_value = "HttpData-PULL", env = "EDC_MEDIATOR_TRANSFER_TYPE")]
    pub transfer_type: String,

    /// Timeout for a single management API request in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "EDC_MEDIATOR_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "EDC_MEDIATOR_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "EDC_MEDIATOR_LOG_LEVEL")]
    pub log_level: String,
}

impl MediatorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("--poll-interval-ms must be greater than zero");
        }
        for (name, value) in [
            ("--negotiation-timeout-ms", self.negotiation_timeout_ms),
            ("--transfer-timeout-ms", self.transfer_timeout_ms),
            ("--credential-timeout-ms", self.credential_timeout_ms),
            ("--request-timeout-ms", self.request_timeout_ms),
            ("--stream-idle-timeout-ms", self.stream_idle_timeout_ms),
        ] {
            if value == 0 {
                anyhow::bail!("{name} must be greater than zero");
            }
        }
        if self.workflow_timeout_ms == Some(0) {
            anyhow::bail!("--workflow-timeout-ms must be greater than zero");
        }
        let shortest = self.negotiation_timeout_ms.min(self.transfer_timeout_ms);
        if self.poll_interval_ms > shortest {
            anyhow::bail!(
                "--poll-interval-ms ({}) exceeds the shortest polling step timeout ({shortest})",
                self.poll_interval_ms
            );
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_millis(self.negotiation_timeout_ms)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }

    pub fn credential_timeout(&self) -> Duration {
        Duration::from_millis(self.credential_timeout_ms)
    }

    /// Global deadline: the explicit cap if set, otherwise the sum of the step deadlines.
    pub fn workflow_timeout(&self) -> Duration {
        match self.workflow_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.negotiation_timeout() + self.transfer_timeout() + self.credential_timeout(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_idle_timeout_ms)
    }

    /// Full URL of the backend credential stream.
    pub fn stream_url(&self) -> String {
        let base = self.backend_url.trim_end_matches('/');
        if self.backend_stream_path.starts_with('/') {
            format!("{base}{}", self.backend_stream_path)
        } else {
            format!("{base}/{}", self.backend_stream_path)
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
