// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-LD request bodies and response parsing for the management API.
//!
//! The connector may return compacted (`state`) or prefixed (`edc:state`)
//! property names depending on its version and context, so lookups accept
//! both spellings plus the expanded IRI.

use serde_json::{json, Map, Value};

use crate::connector::{
    CatalogOffer, ConnectorError, NegotiationRecord, NegotiationRequest, NegotiationState,
    TransferRecord, TransferRequest, TransferState,
};

pub const EDC_NAMESPACE: &str = "https://w3id.org/edc/v0.0.1/ns/";
pub const ODRL_CONTEXT: &str = "http://www.w3.org/ns/odrl.jsonld";
pub const DSP_PROTOCOL: &str = "dataspace-protocol-http";

fn context() -> Value {
    json!({ "@vocab": EDC_NAMESPACE })
}

/// Look up `name` under its bare, prefixed, or expanded spelling.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    let obj = value.as_object()?;
    obj.get(name)
        .or_else(|| obj.get(&format!("edc:{name}")))
        .or_else(|| obj.get(&format!("{EDC_NAMESPACE}{name}")))
}

fn str_field(value: &Value, name: &str) -> Option<String> {
    field(value, name).and_then(Value::as_str).map(str::to_owned)
}

/// Look up a property that may be bare or carry one of the given prefixes.
fn prefixed<'a>(value: &'a Value, name: &str, prefixes: &[&str]) -> Option<&'a Value> {
    let obj = value.as_object()?;
    obj.get(name).or_else(|| prefixes.iter().find_map(|p| obj.get(&format!("{p}:{name}"))))
}

/// Treat a single JSON-LD node and an array of nodes uniformly.
fn nodes(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v @ Value::Object(_)) => vec![v],
        _ => vec![],
    }
}

fn node_id(value: &Value) -> Option<String> {
    value
        .get("@id")
        .or_else(|| value.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Build the `ContractRequest` body for `POST /v3/contractnegotiations`.
pub fn contract_request(request: &NegotiationRequest, offer_id: &str) -> Value {
    let mut policy = match &request.policy {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    policy.entry("@context").or_insert_with(|| json!(ODRL_CONTEXT));
    policy.entry("@type").or_insert_with(|| json!("Offer"));
    policy.insert("@id".to_owned(), json!(offer_id));
    policy.insert("target".to_owned(), json!(request.asset_id));
    if let Some(ref provider_id) = request.provider_id {
        policy.insert("assigner".to_owned(), json!(provider_id));
    }
    for rule in ["permission", "prohibition", "obligation"] {
        policy.entry(rule).or_insert_with(|| json!([]));
    }

    let mut body = json!({
        "@context": context(),
        "@type": "ContractRequest",
        "counterPartyAddress": request.provider_address,
        "protocol": DSP_PROTOCOL,
        "policy": Value::Object(policy),
    });
    if let (Some(provider_id), Some(obj)) = (&request.provider_id, body.as_object_mut()) {
        obj.insert("counterPartyId".to_owned(), json!(provider_id));
    }
    body
}

/// Build the `TransferRequest` body for `POST /v3/transferprocesses`.
pub fn transfer_request(request: &TransferRequest) -> Value {
    json!({
        "@context": context(),
        "@type": "TransferRequest",
        "counterPartyAddress": request.connector_address,
        "contractId": request.contract_agreement_id,
        "protocol": DSP_PROTOCOL,
        "transferType": request.transfer_type,
    })
}

/// Build the `CatalogRequest` body for `POST /v3/catalog/request`, filtered by asset id.
pub fn catalog_request(provider_address: &str, asset_id: &str) -> Value {
    json!({
        "@context": context(),
        "@type": "CatalogRequest",
        "counterPartyAddress": provider_address,
        "protocol": DSP_PROTOCOL,
        "querySpec": {
            "filterExpression": [{
                "operandLeft": format!("{EDC_NAMESPACE}id"),
                "operator": "=",
                "operandRight": asset_id,
            }]
        },
    })
}

/// Extract the id from an `IdResponse`.
pub fn parse_id_response(value: &Value) -> Result<String, ConnectorError> {
    node_id(value)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ConnectorError::Malformed("IdResponse without @id".to_owned()))
}

pub fn parse_negotiation(fallback_id: &str, value: &Value) -> Result<NegotiationRecord, ConnectorError> {
    let state = str_field(value, "state")
        .ok_or_else(|| ConnectorError::Malformed("negotiation without state".to_owned()))?;
    Ok(NegotiationRecord {
        negotiation_id: node_id(value).unwrap_or_else(|| fallback_id.to_owned()),
        state: NegotiationState::parse(&state),
        contract_agreement_id: str_field(value, "contractAgreementId").filter(|s| !s.is_empty()),
        error_detail: str_field(value, "errorDetail").filter(|s| !s.is_empty()),
    })
}

pub fn parse_transfer(fallback_id: &str, value: &Value) -> Result<TransferRecord, ConnectorError> {
    let state = str_field(value, "state")
        .ok_or_else(|| ConnectorError::Malformed("transfer process without state".to_owned()))?;
    Ok(TransferRecord {
        transfer_process_id: node_id(value).unwrap_or_else(|| fallback_id.to_owned()),
        state: TransferState::parse(&state),
        error_detail: str_field(value, "errorDetail").filter(|s| !s.is_empty()),
    })
}

/// Collect offers for `asset_id` from a `dcat:Catalog` response.
pub fn parse_catalog(asset_id: &str, catalog: &Value) -> Vec<CatalogOffer> {
    let participant_id = prefixed(catalog, "participantId", &["dspace", "edc"])
        .and_then(Value::as_str)
        .map(str::to_owned);

    nodes(prefixed(catalog, "dataset", &["dcat"]))
        .into_iter()
        .filter(|dataset| node_id(dataset).as_deref() == Some(asset_id))
        .flat_map(|dataset| nodes(prefixed(dataset, "hasPolicy", &["odrl"])))
        .filter_map(|policy| {
            Some(CatalogOffer {
                asset_id: asset_id.to_owned(),
                offer_id: node_id(policy)?,
                policy: policy.clone(),
                participant_id: participant_id.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
