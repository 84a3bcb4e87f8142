// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendezvous between workflows awaiting a credential and the shared event stream.
//!
//! Every mutation of the waiter table (register, deliver, expire, drop)
//! happens under one mutex, so a transfer id is satisfied at most once and
//! an event can never be handed to a waiter that has already given up.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::credential::CredentialEvent;
use crate::error::{ErrorCode, Step, StepError};

const STEP: Step = Step::Credential;

struct Waiter {
    seq: u64,
    tx: oneshot::Sender<CredentialEvent>,
}

/// Outcome of offering an event to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A registered waiter received the credential.
    Delivered,
    /// Nobody is waiting for this transfer id (unknown, already satisfied, or expired).
    Unmatched,
}

/// Process-wide table of transfer ids awaiting a credential.
pub struct CredentialChannel {
    waiters: Mutex<HashMap<String, Waiter>>,
    next_seq: AtomicU64,
    connected: AtomicBool,
}

impl CredentialChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            waiters: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
            connected: AtomicBool::new(false),
        })
    }

    /// Register interest in `transfer_process_id`.
    ///
    /// Must be called before the credential can be pushed. Dropping the
    /// returned [`Registration`] withdraws the interest.
    pub fn register(self: &Arc<Self>, transfer_process_id: &str) -> Result<Registration, StepError> {
        let (tx, rx) = oneshot::channel();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        {
            let mut waiters = self.waiters.lock();
            if waiters.contains_key(transfer_process_id) {
                return Err(StepError::new(
                    STEP,
                    ErrorCode::Internal,
                    format!("already awaiting a credential for transfer {transfer_process_id}"),
                ));
            }
            waiters.insert(transfer_process_id.to_owned(), Waiter { seq, tx });
        }
        tracing::debug!(%transfer_process_id, "credential interest registered");
        Ok(Registration {
            channel: Arc::clone(self),
            transfer_process_id: transfer_process_id.to_owned(),
            seq,
            rx,
        })
    }

    /// Hand `event` to its waiter, if any. Unmatched events are dropped.
    pub fn deliver(&self, event: CredentialEvent) -> Delivery {
        let transfer_process_id = event.transfer_process_id.clone();
        let delivery = {
            let mut waiters = self.waiters.lock();
            // Sent under the lock: an expiring waiter either sees this
            // event or finds its entry already gone.
            match waiters.remove(&transfer_process_id).map(|w| w.tx.send(event)) {
                Some(Ok(())) => Delivery::Delivered,
                Some(Err(_)) | None => Delivery::Unmatched,
            }
        };
        match delivery {
            Delivery::Delivered => tracing::info!(%transfer_process_id, "credential delivered"),
            Delivery::Unmatched => tracing::debug!(
                %transfer_process_id,
                "ignoring credential for unregistered transfer"
            ),
        }
        delivery
    }

    /// Wait for the credential of `transfer_process_id` until `deadline`.
    pub async fn await_credential(
        self: &Arc<Self>,
        transfer_process_id: &str,
        deadline: Instant,
    ) -> Result<CredentialEvent, StepError> {
        self.register(transfer_process_id)?.wait_until(deadline).await
    }

    /// Number of registrations still waiting.
    pub fn pending(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_registered(&self, transfer_process_id: &str) -> bool {
        self.waiters.lock().contains_key(transfer_process_id)
    }

    /// Whether the event stream is currently connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Fail every pending waiter, e.g. on shutdown.
    pub fn close(&self) {
        let drained: Vec<_> = self.waiters.lock().drain().collect();
        if !drained.is_empty() {
            tracing::info!(pending = drained.len(), "closing pending credential waits");
        }
    }

    fn withdraw(&self, transfer_process_id: &str, seq: u64) {
        let mut waiters = self.waiters.lock();
        if waiters.get(transfer_process_id).is_some_and(|w| w.seq == seq) {
            waiters.remove(transfer_process_id);
            tracing::debug!(%transfer_process_id, "credential interest withdrawn");
        }
    }
}

/// A pending credential wait for one transfer process.
///
/// Dropping it (deadline, client disconnect, failed step) removes the
/// registration so a late event is silently ignored.
pub struct Registration {
    channel: Arc<CredentialChannel>,
    transfer_process_id: String,
    seq: u64,
    rx: oneshot::Receiver<CredentialEvent>,
}

impl Registration {
    pub fn transfer_process_id(&self) -> &str {
        &self.transfer_process_id
    }

    /// Wait for the credential until `deadline`.
    pub async fn wait_until(mut self, deadline: Instant) -> Result<CredentialEvent, StepError> {
        let started = Instant::now();
        match tokio::time::timeout_at(deadline, &mut self.rx).await {
            Ok(Ok(event)) => Ok(event),
            Ok(Err(_)) => Err(StepError::new(
                STEP,
                ErrorCode::ShuttingDown,
                "credential channel closed",
            )),
            Err(_) => {
                // Expire under the lock; a delivery that won the race is kept.
                if let Some(event) = self.expire() {
                    return Ok(event);
                }
                tracing::warn!(
                    transfer_process_id = %self.transfer_process_id,
                    "no credential before deadline"
                );
                Err(StepError::timeout(STEP, started.elapsed()))
            }
        }
    }

    fn expire(&mut self) -> Option<CredentialEvent> {
        let mut waiters = self.channel.waiters.lock();
        if waiters.get(&self.transfer_process_id).is_some_and(|w| w.seq == self.seq) {
            waiters.remove(&self.transfer_process_id);
        }
        self.rx.try_recv().ok()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.channel.withdraw(&self.transfer_process_id, self.seq);
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
