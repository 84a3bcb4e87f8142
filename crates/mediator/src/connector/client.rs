// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the local connector's management API.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::connector::model;
use crate::connector::{
    ApiFuture, CatalogOffer, ConnectorError, ManagementApi, NegotiationRecord, NegotiationRequest,
    TransferRecord, TransferRequest,
};

/// HTTP client wrapper for the management API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ConnectorClient {
    base_url: String,
    api_key: Option<(String, String)>,
    client: Client,
}

impl ConnectorClient {
    pub fn new(
        base_url: &str,
        api_key_header: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.map(|key| (api_key_header.to_owned(), key)),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some((header, key)) => req.header(header.as_str(), key.as_str()),
            None => req,
        }
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, ConnectorError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConnectorError::Rejected { status: status.as_u16(), body });
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ConnectorError::Malformed(e.to_string()))
    }

    async fn get_json(&self, path: &str) -> Result<Value, ConnectorError> {
        let req = self.client.get(self.url(path));
        let resp = self.apply_auth(req).send().await?;
        Self::read_json(resp).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ConnectorError> {
        let req = self.client.post(self.url(path)).json(body);
        let resp = self.apply_auth(req).send().await?;
        Self::read_json(resp).await
    }
}

impl ManagementApi for ConnectorClient {
    fn request_catalog<'a>(
        &'a self,
        provider_address: &'a str,
        asset_id: &'a str,
    ) -> ApiFuture<'a, Vec<CatalogOffer>> {
        Box::pin(async move {
            let body = model::catalog_request(provider_address, asset_id);
            let catalog = self.post_json("/v3/catalog/request", &body).await?;
            Ok(model::parse_catalog(asset_id, &catalog))
        })
    }

    fn initiate_negotiation<'a>(
        &'a self,
        request: &'a NegotiationRequest,
        offer_id: &'a str,
    ) -> ApiFuture<'a, String> {
        Box::pin(async move {
            let body = model::contract_request(request, offer_id);
            let resp = self.post_json("/v3/contractnegotiations", &body).await?;
            model::parse_id_response(&resp)
        })
    }

    fn negotiation<'a>(&'a self, negotiation_id: &'a str) -> ApiFuture<'a, NegotiationRecord> {
        Box::pin(async move {
            let value = self.get_json(&format!("/v3/contractnegotiations/{negotiation_id}")).await?;
            model::parse_negotiation(negotiation_id, &value)
        })
    }

    fn initiate_transfer<'a>(&'a self, request: &'a TransferRequest) -> ApiFuture<'a, String> {
        Box::pin(async move {
            let body = model::transfer_request(request);
            let resp = self.post_json("/v3/transferprocesses", &body).await?;
            model::parse_id_response(&resp)
        })
    }

    fn transfer<'a>(&'a self, transfer_process_id: &'a str) -> ApiFuture<'a, TransferRecord> {
        Box::pin(async move {
            let value =
                self.get_json(&format!("/v3/transferprocesses/{transfer_process_id}")).await?;
            model::parse_transfer(transfer_process_id, &value)
        })
    }
}
