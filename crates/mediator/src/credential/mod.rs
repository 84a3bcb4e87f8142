// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull credentials pushed by the consumer backend.
//!
//! The backend publishes one Server-Sent Event per started pull transfer.
//! Each event's `data` is a JSON object correlated to a transfer process by
//! `transfer_process_id`, carrying the provider data-plane token in
//! `auth_code` and the data-plane URL in `endpoint`.

pub mod channel;
pub mod sse;
pub mod stream;

use serde::{Deserialize, Serialize};

/// A credential delivered for one transfer process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialEvent {
    pub transfer_process_id: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub raw_payload: serde_json::Value,
}

fn first_str(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Parse an SSE `data` payload into a credential event.
///
/// Returns `None` for anything that is not a credential: invalid JSON, a
/// missing correlation id, or a missing token.
pub fn parse_credential_event(data: &str) -> Option<CredentialEvent> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    let transfer_process_id = first_str(&value, &["transfer_process_id", "transferProcessId"])?;
    let token = first_str(&value, &["auth_code", "authCode", "authorization"])?;
    let endpoint = first_str(&value, &["endpoint"]);
    Some(CredentialEvent { transfer_process_id, token, endpoint, raw_payload: value })
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
