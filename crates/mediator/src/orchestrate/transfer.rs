// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull transfer driver.
//!
//! A pull transfer is ready for credential handoff once the connector
//! reports `STARTED`; completion happens later, when the client actually
//! fetches data with the delivered token.

use std::sync::Arc;

use tokio::time::Instant;

use crate::connector::{ManagementApi, TransferRequest, TransferState};
use crate::error::{ErrorCode, Step, StepError};
use crate::orchestrate::{poll_error, poll_until, submit_error, PollError, PollSettings};

const STEP: Step = Step::Transfer;

/// Drives a transfer process from submission to `STARTED`.
pub struct TransferOrchestrator {
    api: Arc<dyn ManagementApi>,
    settings: PollSettings,
}

impl TransferOrchestrator {
    pub fn new(api: Arc<dyn ManagementApi>, settings: PollSettings) -> Self {
        Self { api, settings }
    }

    pub async fn start_transfer(&self, request: &TransferRequest) -> Result<String, StepError> {
        self.start_transfer_until(request, Instant::now() + self.settings.timeout).await
    }

    /// Submit and wait for `STARTED`, giving up at `deadline`.
    pub async fn start_transfer_until(
        &self,
        request: &TransferRequest,
        deadline: Instant,
    ) -> Result<String, StepError> {
        let transfer_process_id = self.submit(request, deadline).await?;
        self.await_started(&transfer_process_id, deadline).await?;
        Ok(transfer_process_id)
    }

    /// Submit the transfer request and return the connector-assigned process id.
    pub async fn submit(
        &self,
        request: &TransferRequest,
        deadline: Instant,
    ) -> Result<String, StepError> {
        let started = Instant::now();
        let submit = self.api.initiate_transfer(request);
        let transfer_process_id = match tokio::time::timeout_at(deadline, submit).await {
            Ok(result) => result.map_err(|e| submit_error(STEP, ErrorCode::TransferFailed, e))?,
            Err(_) => return Err(StepError::timeout(STEP, started.elapsed())),
        };
        tracing::info!(
            %transfer_process_id,
            agreement_id = %request.contract_agreement_id,
            "transfer requested"
        );
        Ok(transfer_process_id)
    }

    /// Poll a submitted transfer until it reports `STARTED`.
    pub async fn await_started(
        &self,
        transfer_process_id: &str,
        deadline: Instant,
    ) -> Result<(), StepError> {
        let started = Instant::now();
        let api = &*self.api;
        let outcome = poll_until(
            STEP,
            self.settings,
            deadline,
            || api.transfer(transfer_process_id),
            |record| {
                tracing::debug!(%transfer_process_id, state = %record.state, "transfer polled");
                let failed = |reason: String| -> Option<Result<(), StepError>> {
                    Some(Err(StepError::new(STEP, ErrorCode::TransferFailed, reason)))
                };
                match record.state {
                    TransferState::Started => Some(Ok(())),
                    TransferState::Terminated => failed(
                        record
                            .error_detail
                            .unwrap_or_else(|| "transfer terminated by connector".to_owned()),
                    ),
                    TransferState::Completed => {
                        failed("transfer completed before credential handoff".to_owned())
                    }
                    _ => None,
                }
            },
        )
        .await;

        match outcome {
            Ok(Ok(())) => {
                tracing::info!(%transfer_process_id, "transfer started");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(%transfer_process_id, err = %e, "transfer failed");
                Err(e)
            }
            Err(e) => {
                if matches!(e, PollError::Deadline) {
                    tracing::warn!(%transfer_process_id, "transfer did not start before deadline");
                }
                Err(poll_error(STEP, e, started))
            }
        }
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
