// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted management API for orchestrator and workflow tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::connector::{
    ApiFuture, CatalogOffer, ConnectorError, ManagementApi, NegotiationRecord, NegotiationRequest,
    NegotiationState, TransferRecord, TransferRequest, TransferState,
};

type Script<T> = Mutex<VecDeque<Result<T, ConnectorError>>>;

/// Replays canned connector responses.
///
/// Poll scripts are consumed front to back; the last entry repeats forever
/// so a script of one non-terminal state models a connector that never settles.
pub struct ScriptedApi {
    catalog: Mutex<Result<Vec<CatalogOffer>, ConnectorError>>,
    negotiation_submit: Mutex<Result<String, ConnectorError>>,
    negotiation_script: Script<NegotiationRecord>,
    transfer_submit: Mutex<Result<String, ConnectorError>>,
    transfer_script: Script<TransferRecord>,
    poll_delay: Duration,
    pub catalog_requests: AtomicUsize,
    pub negotiation_submits: AtomicUsize,
    pub negotiation_polls: AtomicUsize,
    pub transfer_submits: AtomicUsize,
    pub transfer_polls: AtomicUsize,
    pub submitted_offer: Mutex<Option<String>>,
    pub submitted_negotiation: Mutex<Option<NegotiationRequest>>,
    pub submitted_transfer: Mutex<Option<TransferRequest>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            catalog: Mutex::new(Ok(vec![])),
            negotiation_submit: Mutex::new(Ok("N1".to_owned())),
            negotiation_script: Mutex::new(VecDeque::new()),
            transfer_submit: Mutex::new(Ok("T1".to_owned())),
            transfer_script: Mutex::new(VecDeque::new()),
            poll_delay: Duration::ZERO,
            catalog_requests: AtomicUsize::new(0),
            negotiation_submits: AtomicUsize::new(0),
            negotiation_polls: AtomicUsize::new(0),
            transfer_submits: AtomicUsize::new(0),
            transfer_polls: AtomicUsize::new(0),
            submitted_offer: Mutex::new(None),
            submitted_negotiation: Mutex::new(None),
            submitted_transfer: Mutex::new(None),
        }
    }

    pub fn with_catalog(self, offers: Vec<CatalogOffer>) -> Self {
        *self.catalog.lock() = Ok(offers);
        self
    }

    pub fn with_negotiation_submit(self, result: Result<&str, ConnectorError>) -> Self {
        *self.negotiation_submit.lock() = result.map(str::to_owned);
        self
    }

    pub fn with_negotiation_polls(
        self,
        polls: impl IntoIterator<Item = Result<NegotiationRecord, ConnectorError>>,
    ) -> Self {
        self.negotiation_script.lock().extend(polls);
        self
    }

    pub fn with_transfer_submit(self, result: Result<&str, ConnectorError>) -> Self {
        *self.transfer_submit.lock() = result.map(str::to_owned);
        self
    }

    pub fn with_transfer_polls(
        self,
        polls: impl IntoIterator<Item = Result<TransferRecord, ConnectorError>>,
    ) -> Self {
        self.transfer_script.lock().extend(polls);
        self
    }

    /// Delay every state poll, modelling a slow connector.
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn next<T: Clone>(script: &Script<T>, what: &str) -> Result<T, ConnectorError> {
    let mut script = script.lock();
    match script.len() {
        0 => Err(ConnectorError::Malformed(format!("no scripted {what} state"))),
        1 => script[0].clone(),
        _ => script.pop_front().unwrap_or_else(|| {
            Err(ConnectorError::Malformed(format!("no scripted {what} state")))
        }),
    }
}

impl ManagementApi for ScriptedApi {
    fn request_catalog<'a>(
        &'a self,
        _provider_address: &'a str,
        _asset_id: &'a str,
    ) -> ApiFuture<'a, Vec<CatalogOffer>> {
        Box::pin(async move {
            self.catalog_requests.fetch_add(1, Ordering::SeqCst);
            self.catalog.lock().clone()
        })
    }

    fn initiate_negotiation<'a>(
        &'a self,
        request: &'a NegotiationRequest,
        offer_id: &'a str,
    ) -> ApiFuture<'a, String> {
        Box::pin(async move {
            self.negotiation_submits.fetch_add(1, Ordering::SeqCst);
            *self.submitted_offer.lock() = Some(offer_id.to_owned());
            *self.submitted_negotiation.lock() = Some(request.clone());
            self.negotiation_submit.lock().clone()
        })
    }

    fn negotiation<'a>(&'a self, _negotiation_id: &'a str) -> ApiFuture<'a, NegotiationRecord> {
        Box::pin(async move {
            self.negotiation_polls.fetch_add(1, Ordering::SeqCst);
            if !self.poll_delay.is_zero() {
                tokio::time::sleep(self.poll_delay).await;
            }
            next(&self.negotiation_script, "negotiation")
        })
    }

    fn initiate_transfer<'a>(&'a self, request: &'a TransferRequest) -> ApiFuture<'a, String> {
        Box::pin(async move {
            self.transfer_submits.fetch_add(1, Ordering::SeqCst);
            *self.submitted_transfer.lock() = Some(request.clone());
            self.transfer_submit.lock().clone()
        })
    }

    fn transfer<'a>(&'a self, _transfer_process_id: &'a str) -> ApiFuture<'a, TransferRecord> {
        Box::pin(async move {
            self.transfer_polls.fetch_add(1, Ordering::SeqCst);
            if !self.poll_delay.is_zero() {
                tokio::time::sleep(self.poll_delay).await;
            }
            next(&self.transfer_script, "transfer")
        })
    }
}

pub fn negotiation(state: &str) -> Result<NegotiationRecord, ConnectorError> {
    Ok(NegotiationRecord {
        negotiation_id: "N1".to_owned(),
        state: NegotiationState::parse(state),
        contract_agreement_id: None,
        error_detail: None,
    })
}

pub fn finalized(agreement_id: &str) -> Result<NegotiationRecord, ConnectorError> {
    Ok(NegotiationRecord {
        negotiation_id: "N1".to_owned(),
        state: NegotiationState::Finalized,
        contract_agreement_id: Some(agreement_id.to_owned()),
        error_detail: None,
    })
}

pub fn terminated(reason: Option<&str>) -> Result<NegotiationRecord, ConnectorError> {
    Ok(NegotiationRecord {
        negotiation_id: "N1".to_owned(),
        state: NegotiationState::Terminated,
        contract_agreement_id: None,
        error_detail: reason.map(str::to_owned),
    })
}

pub fn transfer(state: &str) -> Result<TransferRecord, ConnectorError> {
    Ok(TransferRecord {
        transfer_process_id: "T1".to_owned(),
        state: TransferState::parse(state),
        error_detail: None,
    })
}

pub fn unreachable() -> ConnectorError {
    ConnectorError::Unreachable("connection refused".to_owned())
}

pub fn negotiation_request() -> NegotiationRequest {
    NegotiationRequest {
        provider_address: "http://provider:19194/protocol".to_owned(),
        provider_id: Some("provider".to_owned()),
        offer_id: Some("offer-1".to_owned()),
        asset_id: "asset-1".to_owned(),
        policy: None,
    }
}
