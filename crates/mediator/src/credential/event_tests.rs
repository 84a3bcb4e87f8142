// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::parse_credential_event;

#[test]
fn parses_backend_payload() -> anyhow::Result<()> {
    let data = r#"{
        "transfer_process_id": "T1",
        "auth_code": "tok-123",
        "auth_key": "Authorization",
        "endpoint": "http://provider:19291/public",
        "id": "edr-1"
    }"#;
    let event = parse_credential_event(data).ok_or_else(|| anyhow::anyhow!("not parsed"))?;
    assert_eq!(event.transfer_process_id, "T1");
    assert_eq!(event.token, "tok-123");
    assert_eq!(event.endpoint.as_deref(), Some("http://provider:19291/public"));
    assert_eq!(event.raw_payload["auth_key"], "Authorization");
    Ok(())
}

#[test]
fn accepts_camel_case_fields() {
    let event = parse_credential_event(r#"{"transferProcessId":"T2","authCode":"tok"}"#);
    assert_eq!(event.map(|e| (e.transfer_process_id, e.token)), Some(("T2".into(), "tok".into())));
}

#[yare::parameterized(
    not_json        = { "keep-alive" },
    no_transfer_id  = { r#"{"auth_code":"tok"}"# },
    no_token        = { r#"{"transfer_process_id":"T1"}"# },
    empty_token     = { r#"{"transfer_process_id":"T1","auth_code":""}"# },
    non_string_id   = { r#"{"transfer_process_id":42,"auth_code":"tok"}"# },
)]
fn ignores_non_credentials(data: &str) {
    assert!(parse_credential_event(data).is_none());
}
