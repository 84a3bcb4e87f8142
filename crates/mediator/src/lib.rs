// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! EDC mediator: turns a single client request into a contract negotiation,
//! a pull transfer, and the provider data-plane credential for it.

pub mod config;
pub mod connector;
pub mod credential;
pub mod error;
pub mod orchestrate;
pub mod state;
pub mod transport;
pub mod workflow;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::MediatorConfig;
use crate::connector::client::ConnectorClient;
use crate::credential::channel::CredentialChannel;
use crate::credential::stream::{spawn_credential_stream, StreamConfig};
use crate::state::MediatorState;
use crate::transport::build_router;

/// Run the mediator until `shutdown` is cancelled.
pub async fn run(config: MediatorConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let addr = format!("{}:{}", config.host, config.port);
    let api = ConnectorClient::new(
        &config.management_url,
        &config.management_api_key_header,
        config.management_api_key.clone(),
        config.request_timeout(),
    )?;

    let channel = CredentialChannel::new();
    let stream = spawn_credential_stream(
        Arc::clone(&channel),
        StreamConfig::new(config.stream_url(), config.backend_api_key.clone())
            .with_idle_timeout(config.stream_idle_timeout()),
        shutdown.clone(),
    )?;

    tracing::info!(
        management_url = %config.management_url,
        stream_url = %config.stream_url(),
        "edc-mediator listening on {addr}"
    );
    let state = Arc::new(MediatorState::new(
        &config,
        Arc::new(api),
        Arc::clone(&channel),
        shutdown.clone(),
    ));
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    channel.close();
    if let Err(e) = stream.await {
        tracing::warn!(err = %e, "credential stream task failed");
    }
    Ok(())
}
