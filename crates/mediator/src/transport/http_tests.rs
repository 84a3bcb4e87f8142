// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::WorkflowRequest;

fn request(value: serde_json::Value) -> anyhow::Result<WorkflowRequest> {
    Ok(serde_json::from_value(value)?)
}

#[test]
fn minimal_request_is_accepted() -> anyhow::Result<()> {
    let req = request(json!({
        "provider_address": " http://provider:19194/protocol ",
        "asset_id": "asset-1"
    }))?;
    let negotiation = req.validate().map_err(anyhow::Error::msg)?;
    assert_eq!(negotiation.provider_address, "http://provider:19194/protocol");
    assert_eq!(negotiation.offer_id, None);
    assert_eq!(negotiation.policy, None);
    Ok(())
}

#[test]
fn blank_provider_id_is_dropped() -> anyhow::Result<()> {
    let req = request(json!({
        "provider_address": "https://provider/protocol",
        "provider_id": "  ",
        "offer_id": "offer-1",
        "asset_id": "asset-1",
        "policy": {"odrl:permission": []}
    }))?;
    let negotiation = req.validate().map_err(anyhow::Error::msg)?;
    assert_eq!(negotiation.provider_id, None);
    assert_eq!(negotiation.offer_id.as_deref(), Some("offer-1"));
    Ok(())
}

#[yare::parameterized(
    not_a_url       = { json!({"provider_address": "provider", "asset_id": "a"}), "invalid provider_address" },
    wrong_scheme    = { json!({"provider_address": "ftp://provider", "asset_id": "a"}), "unsupported provider_address scheme" },
    empty_asset     = { json!({"provider_address": "http://p", "asset_id": " "}), "asset_id" },
    empty_offer     = { json!({"provider_address": "http://p", "asset_id": "a", "offer_id": ""}), "offer_id" },
    policy_not_obj  = { json!({"provider_address": "http://p", "asset_id": "a", "policy": [1]}), "policy" },
)]
fn invalid_request(value: serde_json::Value, expected: &str) {
    let req: WorkflowRequest = serde_json::from_value(value).expect("well-formed body");
    let msg = req.validate().expect_err("expected validation error");
    assert!(msg.contains(expected), "expected '{expected}' in: {msg}");
}
