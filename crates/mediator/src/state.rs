// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::MediatorConfig;
use crate::connector::ManagementApi;
use crate::credential::channel::CredentialChannel;
use crate::workflow::WorkflowCoordinator;

/// Shared mediator state.
pub struct MediatorState {
    pub coordinator: WorkflowCoordinator,
    pub channel: Arc<CredentialChannel>,
    pub shutdown: CancellationToken,
}

impl MediatorState {
    pub fn new(
        config: &MediatorConfig,
        api: Arc<dyn ManagementApi>,
        channel: Arc<CredentialChannel>,
        shutdown: CancellationToken,
    ) -> Self {
        let coordinator =
            WorkflowCoordinator::from_config(config, api, Arc::clone(&channel), shutdown.clone());
        Self { coordinator, channel, shutdown }
    }
}
