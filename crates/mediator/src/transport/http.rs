// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the mediator.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::connector::NegotiationRequest;
use crate::error::ErrorCode;
use crate::state::MediatorState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub pending_credentials: usize,
    pub stream_connected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRequest {
    pub provider_address: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub offer_id: Option<String>,
    pub asset_id: String,
    #[serde(default)]
    pub policy: Option<serde_json::Value>,
}

impl WorkflowRequest {
    /// Check field contents and convert into a negotiation request.
    pub fn validate(self) -> Result<NegotiationRequest, String> {
        let provider_address = self.provider_address.trim();
        match reqwest::Url::parse(provider_address) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => return Err(format!("unsupported provider_address scheme: {}", url.scheme())),
            Err(e) => return Err(format!("invalid provider_address: {e}")),
        }
        if self.asset_id.trim().is_empty() {
            return Err("asset_id must not be empty".to_owned());
        }
        if self.offer_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err("offer_id must not be empty when given".to_owned());
        }
        if self.policy.as_ref().is_some_and(|p| !p.is_object()) {
            return Err("policy must be a JSON object".to_owned());
        }

        Ok(NegotiationRequest {
            provider_address: provider_address.to_owned(),
            provider_id: self.provider_id.filter(|id| !id.trim().is_empty()),
            offer_id: self.offer_id,
            asset_id: self.asset_id,
            policy: self.policy,
        })
    }
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<MediatorState>>) -> impl IntoResponse {
    let status = if s.shutdown.is_cancelled() { "shutting_down" } else { "running" };
    Json(HealthResponse {
        status: status.to_owned(),
        pending_credentials: s.channel.pending(),
        stream_connected: s.channel.is_connected(),
    })
}

/// `POST /api/v1/workflows`: run one workflow and return the pull credential.
///
/// Blocks until the workflow settles. A client disconnect drops the workflow.
pub async fn run_workflow(
    State(s): State<Arc<MediatorState>>,
    body: Result<Json<WorkflowRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return ErrorCode::InvalidInput.to_http_response(None, rejection.body_text()).into_response();
        }
    };
    let request = match req.validate() {
        Ok(request) => request,
        Err(message) => {
            return ErrorCode::InvalidInput.to_http_response(None, message).into_response();
        }
    };

    match s.coordinator.run_workflow(request).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.to_http_response().into_response(),
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
