// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end pull workflow: negotiate, transfer, await the credential.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::MediatorConfig;
use crate::connector::{ManagementApi, NegotiationRequest, TransferRequest};
use crate::credential::channel::{CredentialChannel, Registration};
use crate::error::{ErrorCode, Step, StepError};
use crate::orchestrate::negotiation::NegotiationOrchestrator;
use crate::orchestrate::transfer::TransferOrchestrator;
use crate::orchestrate::PollSettings;

/// Everything a client needs to pull data from the provider's data plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub contract_agreement_id: String,
    pub transfer_process_id: String,
    pub bearer_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Deadlines and connector parameters for one workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub poll_interval: Duration,
    pub upstream_retries: u32,
    pub negotiation_timeout: Duration,
    pub transfer_timeout: Duration,
    pub credential_timeout: Duration,
    pub workflow_timeout: Duration,
    pub transfer_type: String,
}

impl WorkflowSettings {
    pub fn from_config(config: &MediatorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            upstream_retries: config.upstream_retries,
            negotiation_timeout: config.negotiation_timeout(),
            transfer_timeout: config.transfer_timeout(),
            credential_timeout: config.credential_timeout(),
            workflow_timeout: config.workflow_timeout(),
            transfer_type: config.transfer_type.clone(),
        }
    }

    fn poll(&self, timeout: Duration) -> PollSettings {
        PollSettings { interval: self.poll_interval, timeout, upstream_retries: self.upstream_retries }
    }
}

enum Phase {
    Negotiating,
    Transferring { agreement_id: String },
    AwaitingCredential { agreement_id: String, registration: Registration },
    Done(WorkflowResult),
    Failed(StepError),
}

/// Runs workflows. One coordinator is shared by every request.
pub struct WorkflowCoordinator {
    negotiation: NegotiationOrchestrator,
    transfer: TransferOrchestrator,
    channel: Arc<CredentialChannel>,
    settings: WorkflowSettings,
    shutdown: CancellationToken,
}

impl WorkflowCoordinator {
    pub fn new(
        api: Arc<dyn ManagementApi>,
        channel: Arc<CredentialChannel>,
        settings: WorkflowSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            negotiation: NegotiationOrchestrator::new(
                Arc::clone(&api),
                settings.poll(settings.negotiation_timeout),
            ),
            transfer: TransferOrchestrator::new(api, settings.poll(settings.transfer_timeout)),
            channel,
            settings,
            shutdown,
        }
    }

    pub fn from_config(
        config: &MediatorConfig,
        api: Arc<dyn ManagementApi>,
        channel: Arc<CredentialChannel>,
        shutdown: CancellationToken,
    ) -> Self {
        Self::new(api, channel, WorkflowSettings::from_config(config), shutdown)
    }

    /// Run one workflow to completion.
    ///
    /// Steps run strictly in order and none is retried. Dropping the returned
    /// future stops polling and withdraws any pending credential wait.
    pub async fn run_workflow(&self, request: NegotiationRequest) -> Result<WorkflowResult, StepError> {
        let workflow_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("workflow", %workflow_id, asset_id = %request.asset_id);
        self.drive(request).instrument(span).await
    }

    async fn drive(&self, request: NegotiationRequest) -> Result<WorkflowResult, StepError> {
        let started = Instant::now();
        let global = started + self.settings.workflow_timeout;
        tracing::info!(provider = %request.provider_address, "workflow started");

        let mut phase = Phase::Negotiating;
        loop {
            phase = match phase {
                Phase::Negotiating => {
                    let deadline = step_deadline(self.settings.negotiation_timeout, global);
                    let negotiated = self
                        .guarded(Step::Negotiation, self.negotiation.negotiate_until(&request, deadline))
                        .await;
                    match negotiated {
                        Ok(agreement_id) => Phase::Transferring { agreement_id },
                        Err(e) => Phase::Failed(e),
                    }
                }
                Phase::Transferring { agreement_id } => {
                    let deadline = step_deadline(self.settings.transfer_timeout, global);
                    let transfer = TransferRequest {
                        contract_agreement_id: agreement_id.clone(),
                        connector_address: request.provider_address.clone(),
                        transfer_type: self.settings.transfer_type.clone(),
                    };
                    match self.guarded(Step::Transfer, self.start_transfer(&transfer, deadline)).await {
                        Ok(registration) => Phase::AwaitingCredential { agreement_id, registration },
                        Err(e) => Phase::Failed(e),
                    }
                }
                Phase::AwaitingCredential { agreement_id, registration } => {
                    let deadline = step_deadline(self.settings.credential_timeout, global);
                    let transfer_process_id = registration.transfer_process_id().to_owned();
                    match self.guarded(Step::Credential, registration.wait_until(deadline)).await {
                        Ok(event) => Phase::Done(WorkflowResult {
                            contract_agreement_id: agreement_id,
                            transfer_process_id,
                            bearer_token: event.token,
                            endpoint: event.endpoint,
                        }),
                        Err(e) => Phase::Failed(e),
                    }
                }
                Phase::Done(result) => {
                    tracing::info!(
                        agreement_id = %result.contract_agreement_id,
                        transfer_process_id = %result.transfer_process_id,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "workflow completed"
                    );
                    return Ok(result);
                }
                Phase::Failed(e) => {
                    tracing::warn!(step = %e.step, code = %e.code, err = %e.message, "workflow failed");
                    return Err(e);
                }
            };
        }
    }

    /// Submit the transfer, register for its credential, then wait for `STARTED`.
    ///
    /// Registration happens before polling so a credential pushed as soon as
    /// the transfer starts cannot be missed.
    async fn start_transfer(
        &self,
        request: &TransferRequest,
        deadline: Instant,
    ) -> Result<Registration, StepError> {
        let transfer_process_id = self.transfer.submit(request, deadline).await?;
        let registration = self
            .channel
            .register(&transfer_process_id)
            .map_err(|e| StepError::new(Step::Transfer, e.code, e.message))?;
        self.transfer.await_started(&transfer_process_id, deadline).await?;
        Ok(registration)
    }

    async fn guarded<T>(
        &self,
        step: Step,
        fut: impl Future<Output = Result<T, StepError>>,
    ) -> Result<T, StepError> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                Err(StepError::new(step, ErrorCode::ShuttingDown, "mediator is shutting down"))
            }
            result = fut => result,
        }
    }
}

fn step_deadline(step_timeout: Duration, global: Instant) -> Instant {
    (Instant::now() + step_timeout).min(global)
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
