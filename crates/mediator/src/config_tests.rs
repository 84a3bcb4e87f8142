// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

use super::MediatorConfig;

fn parse(args: &[&str]) -> MediatorConfig {
    MediatorConfig::parse_from(args)
}

#[test]
fn defaults_are_valid() -> anyhow::Result<()> {
    let config = parse(&["edc-mediator"]);
    config.validate()?;
    assert_eq!(config.port, 8000);
    assert_eq!(config.poll_interval(), Duration::from_secs(1));
    assert_eq!(config.transfer_type, "HttpData-PULL");
    Ok(())
}

#[test]
fn workflow_timeout_defaults_to_step_sum() {
    let config = parse(&[
        "edc-mediator",
        "--negotiation-timeout-ms",
        "1000",
        "--transfer-timeout-ms",
        "2000",
        "--credential-timeout-ms",
        "3000",
    ]);
    assert_eq!(config.workflow_timeout(), Duration::from_millis(6000));
}

#[test]
fn workflow_timeout_explicit_cap() {
    let config = parse(&["edc-mediator", "--workflow-timeout-ms", "4500"]);
    assert_eq!(config.workflow_timeout(), Duration::from_millis(4500));
}

#[yare::parameterized(
    trailing_slash = { "http://backend:28000/", "/pull/stream", "http://backend:28000/pull/stream" },
    bare_path      = { "http://backend:28000", "pull/stream", "http://backend:28000/pull/stream" },
    plain          = { "http://backend:28000", "/events", "http://backend:28000/events" },
)]
fn stream_url_joins(base: &str, path: &str, expected: &str) {
    let config =
        parse(&["edc-mediator", "--backend-url", base, "--backend-stream-path", path]);
    assert_eq!(config.stream_url(), expected);
}

#[yare::parameterized(
    zero_interval   = { &["edc-mediator", "--poll-interval-ms", "0"], "poll-interval-ms" },
    zero_step       = { &["edc-mediator", "--transfer-timeout-ms", "0"], "transfer-timeout-ms" },
    zero_workflow   = { &["edc-mediator", "--workflow-timeout-ms", "0"], "workflow-timeout-ms" },
    zero_idle       = { &["edc-mediator", "--stream-idle-timeout-ms", "0"], "stream-idle-timeout-ms" },
    interval_too_long = { &["edc-mediator", "--poll-interval-ms", "5000", "--negotiation-timeout-ms", "1000"],
                          "exceeds" },
    bad_log_format  = { &["edc-mediator", "--log-format", "xml"], "invalid log format" },
)]
fn invalid_config(args: &[&str], expected_substr: &str) {
    let config = parse(args);
    let err = config.validate().expect_err("expected validation error").to_string();
    assert!(err.contains(expected_substr), "expected {expected_substr:?} in {err:?}");
}
