// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local connector management API: domain records, the API seam, and the HTTP client.

pub mod client;
pub mod model;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Negotiation parameters submitted by a workflow. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRequest {
    /// DSP protocol address of the provider connector.
    pub provider_address: String,
    /// Participant id of the provider, sent as the offer's assigner.
    #[serde(default)]
    pub provider_id: Option<String>,
    /// Offer to negotiate. Resolved from the provider catalog when absent.
    #[serde(default)]
    pub offer_id: Option<String>,
    pub asset_id: String,
    /// ODRL policy body accompanying the offer.
    #[serde(default)]
    pub policy: Option<serde_json::Value>,
}

/// Pull transfer parameters. Requires a finalized negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub contract_agreement_id: String,
    pub connector_address: String,
    pub transfer_type: String,
}

/// Contract negotiation state as reported by the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    Requested,
    Offered,
    Accepted,
    Agreed,
    Finalized,
    Terminated,
    /// Intermediate connector states (`REQUESTING`, `VERIFIED`, ...).
    Other(String),
}

impl NegotiationState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "REQUESTED" => Self::Requested,
            "OFFERED" => Self::Offered,
            "ACCEPTED" => Self::Accepted,
            "AGREED" => Self::Agreed,
            "FINALIZED" => Self::Finalized,
            "TERMINATED" => Self::Terminated,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Terminated)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("REQUESTED"),
            Self::Offered => f.write_str("OFFERED"),
            Self::Accepted => f.write_str("ACCEPTED"),
            Self::Agreed => f.write_str("AGREED"),
            Self::Finalized => f.write_str("FINALIZED"),
            Self::Terminated => f.write_str("TERMINATED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Observed snapshot of a contract negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationRecord {
    pub negotiation_id: String,
    pub state: NegotiationState,
    /// Present only once the negotiation is agreed or finalized.
    pub contract_agreement_id: Option<String>,
    pub error_detail: Option<String>,
}

/// Transfer process state as reported by the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Requested,
    Starting,
    Started,
    Completed,
    Terminated,
    Other(String),
}

impl TransferState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "REQUESTED" => Self::Requested,
            "STARTING" => Self::Starting,
            "STARTED" => Self::Started,
            "COMPLETED" => Self::Completed,
            "TERMINATED" => Self::Terminated,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("REQUESTED"),
            Self::Starting => f.write_str("STARTING"),
            Self::Started => f.write_str("STARTED"),
            Self::Completed => f.write_str("COMPLETED"),
            Self::Terminated => f.write_str("TERMINATED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Observed snapshot of a transfer process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub transfer_process_id: String,
    pub state: TransferState,
    pub error_detail: Option<String>,
}

/// An offer found in a provider catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogOffer {
    pub asset_id: String,
    pub offer_id: String,
    pub policy: serde_json::Value,
    pub participant_id: Option<String>,
}

/// Failure talking to the management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Connection, TLS, or timeout failure.
    Unreachable(String),
    /// The connector answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The response body did not have the expected shape.
    Malformed(String),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable(e) => write!(f, "connector unreachable: {e}"),
            Self::Rejected { status, body } if body.is_empty() => {
                write!(f, "connector rejected request ({status})")
            }
            Self::Rejected { status, body } => {
                write!(f, "connector rejected request ({status}): {body}")
            }
            Self::Malformed(e) => write!(f, "malformed connector response: {e}"),
        }
    }
}

impl std::error::Error for ConnectorError {}

impl From<reqwest::Error> for ConnectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Unreachable(e.to_string())
        }
    }
}

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ConnectorError>> + Send + 'a>>;

/// Operations the orchestrators need from the local connector.
///
/// Object-safe for use as `Arc<dyn ManagementApi>`. Only the `initiate_*`
/// calls mutate connector state; the rest are read-only.
pub trait ManagementApi: Send + Sync + 'static {
    /// Look up the offers a provider publishes for `asset_id`.
    fn request_catalog<'a>(
        &'a self,
        provider_address: &'a str,
        asset_id: &'a str,
    ) -> ApiFuture<'a, Vec<CatalogOffer>>;

    /// Start a negotiation for a resolved offer and return its id.
    fn initiate_negotiation<'a>(
        &'a self,
        request: &'a NegotiationRequest,
        offer_id: &'a str,
    ) -> ApiFuture<'a, String>;

    fn negotiation<'a>(&'a self, negotiation_id: &'a str) -> ApiFuture<'a, NegotiationRecord>;

    /// Start a transfer process and return its id.
    fn initiate_transfer<'a>(&'a self, request: &'a TransferRequest) -> ApiFuture<'a, String>;

    fn transfer<'a>(&'a self, transfer_process_id: &'a str) -> ApiFuture<'a, TransferRecord>;
}
