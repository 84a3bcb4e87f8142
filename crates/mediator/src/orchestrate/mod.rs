// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drivers for the connector's negotiation and transfer state machines.
//!
//! Both orchestrators submit once, then poll read-only state at a fixed
//! interval until the connector reports a settling state or the deadline
//! passes. Nothing is cancelled connector-side when the mediator stops
//! waiting.

pub mod negotiation;
pub mod transfer;

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::connector::ConnectorError;
use crate::error::{ErrorCode, Step, StepError};

/// Polling contract shared by both orchestrators.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// Step deadline used when the caller does not supply one.
    pub timeout: Duration,
    /// Consecutive failed polls tolerated before reporting the connector unavailable.
    pub upstream_retries: u32,
}

pub(crate) enum PollError {
    Deadline,
    Upstream(ConnectorError),
}

/// Poll `fetch` until `settle` yields a value or `deadline` passes.
///
/// No fetch is started at or after the deadline, and an in-flight fetch is
/// abandoned when the deadline fires.
pub(crate) async fn poll_until<S, R, F, Fut>(
    step: Step,
    settings: PollSettings,
    deadline: Instant,
    mut fetch: F,
    mut settle: impl FnMut(S) -> Option<R>,
) -> Result<R, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, ConnectorError>>,
{
    let mut failures = 0u32;
    loop {
        if Instant::now() >= deadline {
            return Err(PollError::Deadline);
        }

        match tokio::time::timeout_at(deadline, fetch()).await {
            Err(_) => return Err(PollError::Deadline),
            Ok(Ok(state)) => {
                failures = 0;
                if let Some(outcome) = settle(state) {
                    return Ok(outcome);
                }
            }
            Ok(Err(e)) => {
                failures += 1;
                if failures > settings.upstream_retries {
                    return Err(PollError::Upstream(e));
                }
                tracing::debug!(%step, failures, err = %e, "poll failed, retrying");
            }
        }

        tokio::time::sleep_until((Instant::now() + settings.interval).min(deadline)).await;
    }
}

/// Map a failed submission to the step's error taxonomy.
pub(crate) fn submit_error(step: Step, failed: ErrorCode, err: ConnectorError) -> StepError {
    match err {
        ConnectorError::Unreachable(_) => StepError::upstream(step, err),
        ConnectorError::Rejected { .. } | ConnectorError::Malformed(_) => {
            StepError::new(step, failed, err.to_string())
        }
    }
}

pub(crate) fn poll_error(step: Step, err: PollError, started: Instant) -> StepError {
    match err {
        PollError::Deadline => StepError::timeout(step, started.elapsed()),
        PollError::Upstream(e) => StepError::upstream(step, e),
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
