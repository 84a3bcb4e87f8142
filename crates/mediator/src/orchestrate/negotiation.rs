// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract negotiation driver.

use std::sync::Arc;

use tokio::time::Instant;

use crate::connector::{ManagementApi, NegotiationRequest, NegotiationState};
use crate::error::{ErrorCode, Step, StepError};
use crate::orchestrate::{poll_error, poll_until, submit_error, PollError, PollSettings};

const STEP: Step = Step::Negotiation;

/// Drives a contract negotiation from submission to `FINALIZED` or `TERMINATED`.
pub struct NegotiationOrchestrator {
    api: Arc<dyn ManagementApi>,
    settings: PollSettings,
}

impl NegotiationOrchestrator {
    pub fn new(api: Arc<dyn ManagementApi>, settings: PollSettings) -> Self {
        Self { api, settings }
    }

    /// Negotiate within the configured step timeout and return the agreement id.
    pub async fn negotiate(&self, request: &NegotiationRequest) -> Result<String, StepError> {
        self.negotiate_until(request, Instant::now() + self.settings.timeout).await
    }

    /// Negotiate, giving up at `deadline`.
    pub async fn negotiate_until(
        &self,
        request: &NegotiationRequest,
        deadline: Instant,
    ) -> Result<String, StepError> {
        let started = Instant::now();
        let submit = async {
            let resolved = self.resolve_offer(request).await?;
            let offer_id = resolved.offer_id.as_deref().unwrap_or_default();
            self.api
                .initiate_negotiation(&resolved, offer_id)
                .await
                .map_err(|e| submit_error(STEP, ErrorCode::NegotiationFailed, e))
        };
        let negotiation_id = match tokio::time::timeout_at(deadline, submit).await {
            Ok(result) => result?,
            Err(_) => return Err(StepError::timeout(STEP, started.elapsed())),
        };
        tracing::info!(%negotiation_id, asset_id = %request.asset_id, "negotiation requested");

        let api = &*self.api;
        let id = negotiation_id.as_str();
        let outcome = poll_until(
            STEP,
            self.settings,
            deadline,
            || api.negotiation(id),
            |record| {
                tracing::debug!(negotiation_id = %id, state = %record.state, "negotiation polled");
                match record.state {
                    NegotiationState::Finalized => Some(match record.contract_agreement_id {
                        Some(agreement_id) => Ok(agreement_id),
                        None => Err(StepError::new(
                            STEP,
                            ErrorCode::NegotiationFailed,
                            "negotiation finalized without a contract agreement id",
                        )),
                    }),
                    NegotiationState::Terminated => Some(Err(StepError::new(
                        STEP,
                        ErrorCode::NegotiationFailed,
                        record
                            .error_detail
                            .unwrap_or_else(|| "negotiation terminated by connector".to_owned()),
                    ))),
                    _ => None,
                }
            },
        )
        .await;

        match outcome {
            Ok(Ok(agreement_id)) => {
                tracing::info!(%negotiation_id, %agreement_id, "negotiation finalized");
                Ok(agreement_id)
            }
            Ok(Err(e)) => {
                tracing::warn!(%negotiation_id, err = %e, "negotiation failed");
                Err(e)
            }
            Err(e) => {
                if matches!(e, PollError::Deadline) {
                    tracing::warn!(%negotiation_id, "negotiation did not settle before deadline");
                }
                Err(poll_error(STEP, e, started))
            }
        }
    }

    /// Complete the request from the provider catalog.
    ///
    /// The catalog is consulted when the caller named no offer or no provider
    /// participant id. A caller-supplied offer id and policy are kept.
    async fn resolve_offer(
        &self,
        request: &NegotiationRequest,
    ) -> Result<NegotiationRequest, StepError> {
        if request.offer_id.is_some() && request.provider_id.is_some() {
            return Ok(request.clone());
        }

        let offers = self
            .api
            .request_catalog(&request.provider_address, &request.asset_id)
            .await
            .map_err(|e| submit_error(STEP, ErrorCode::NegotiationFailed, e))?;

        let mut resolved = request.clone();
        match request.offer_id.as_deref() {
            Some(offer_id) => {
                let participant_id = offers
                    .iter()
                    .find(|offer| offer.offer_id == offer_id)
                    .or_else(|| offers.first())
                    .and_then(|offer| offer.participant_id.clone());
                resolved.provider_id = participant_id;
            }
            None => {
                let Some(offer) = offers.into_iter().next() else {
                    return Err(StepError::new(
                        STEP,
                        ErrorCode::NegotiationFailed,
                        format!("provider catalog has no offer for asset {}", request.asset_id),
                    ));
                };
                tracing::debug!(
                    asset_id = %request.asset_id,
                    offer_id = %offer.offer_id,
                    "offer resolved from catalog"
                );
                resolved.offer_id = Some(offer.offer_id);
                if resolved.provider_id.is_none() {
                    resolved.provider_id = offer.participant_id;
                }
                if resolved.policy.is_none() {
                    resolved.policy = Some(offer.policy);
                }
            }
        }

        if resolved.provider_id.is_none() {
            return Err(StepError::new(
                STEP,
                ErrorCode::NegotiationFailed,
                format!("provider catalog at {} names no participant id", request.provider_address),
            ));
        }
        Ok(resolved)
    }
}

#[cfg(test)]
#[path = "negotiation_tests.rs"]
mod tests;
