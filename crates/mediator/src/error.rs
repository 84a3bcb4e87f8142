// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error codes for the mediator API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    NegotiationFailed,
    NegotiationTimeout,
    TransferFailed,
    TransferTimeout,
    CredentialTimeout,
    UpstreamUnavailable,
    InvalidInput,
    ShuttingDown,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NegotiationFailed | Self::TransferFailed => 502,
            Self::NegotiationTimeout | Self::TransferTimeout | Self::CredentialTimeout => 504,
            Self::UpstreamUnavailable | Self::ShuttingDown => 503,
            Self::InvalidInput => 400,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NegotiationFailed => "NEGOTIATION_FAILED",
            Self::NegotiationTimeout => "NEGOTIATION_TIMEOUT",
            Self::TransferFailed => "TRANSFER_FAILED",
            Self::TransferTimeout => "TRANSFER_TIMEOUT",
            Self::CredentialTimeout => "CREDENTIAL_TIMEOUT",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, step: Option<Step>, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), step, message: message.into() }
    }

    pub fn to_http_response(
        &self,
        step: Option<Step>,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(step, message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow step an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Negotiation,
    Transfer,
    Credential,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negotiation => "negotiation",
            Self::Transfer => "transfer",
            Self::Credential => "credential",
        }
    }

    /// Code reported when this step's deadline passes.
    pub fn timeout_code(&self) -> ErrorCode {
        match self {
            Self::Negotiation => ErrorCode::NegotiationTimeout,
            Self::Transfer => ErrorCode::TransferTimeout,
            Self::Credential => ErrorCode::CredentialTimeout,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised by one workflow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub step: Step,
    pub code: ErrorCode,
    pub message: String,
}

impl StepError {
    pub fn new(step: Step, code: ErrorCode, message: impl Into<String>) -> Self {
        Self { step, code, message: message.into() }
    }

    pub fn timeout(step: Step, waited: std::time::Duration) -> Self {
        Self::new(step, step.timeout_code(), format!("no result after {}ms", waited.as_millis()))
    }

    pub fn upstream(step: Step, err: impl fmt::Display) -> Self {
        Self::new(step, ErrorCode::UpstreamUnavailable, err.to_string())
    }

    pub fn to_http_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        self.code.to_http_response(Some(self.step), self.message.clone())
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} during {}: {}", self.code, self.step, self.message)
    }
}

impl std::error::Error for StepError {}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code, the step reached, and a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    pub message: String,
}
