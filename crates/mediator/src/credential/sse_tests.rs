// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{SseDecoder, SseFrame};

fn data(frames: &[SseFrame]) -> Vec<&str> {
    frames.iter().map(|f| f.data.as_str()).collect()
}

#[test]
fn single_event() {
    let mut decoder = SseDecoder::new();
    let frames = decoder.feed(b"data: {\"a\":1}\n\n");
    assert_eq!(data(&frames), vec![r#"{"a":1}"#]);
    assert!(frames[0].event.is_none());
}

#[test]
fn crlf_line_endings() {
    let mut decoder = SseDecoder::new();
    let frames = decoder.feed(b"event: credential\r\ndata: x\r\n\r\n");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].event.as_deref(), Some("credential"));
    assert_eq!(frames[0].data, "x");
}

#[test]
fn chunk_split_mid_line() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"data: {\"transfer_pro").is_empty());
    assert!(decoder.feed(b"cess_id\":\"T1\"}\n").is_empty());
    let frames = decoder.feed(b"\n");
    assert_eq!(data(&frames), vec![r#"{"transfer_process_id":"T1"}"#]);
}

#[test]
fn chunk_split_inside_utf8_sequence() {
    let mut decoder = SseDecoder::new();
    let bytes = "data: héllo\n\n".as_bytes();
    // 'é' is two bytes; split between them.
    let split = "data: h".len() + 1;
    assert!(decoder.feed(&bytes[..split]).is_empty());
    let frames = decoder.feed(&bytes[split..]);
    assert_eq!(data(&frames), vec!["héllo"]);
}

#[test]
fn multi_line_data_joined_with_newline() {
    let mut decoder = SseDecoder::new();
    let frames = decoder.feed(b"data: first\ndata: second\n\n");
    assert_eq!(data(&frames), vec!["first\nsecond"]);
}

#[test]
fn comments_and_unknown_fields_ignored() {
    let mut decoder = SseDecoder::new();
    let frames = decoder.feed(b": keep-alive\n\nretry: 5000\nfoo: bar\ndata: payload\n\n");
    assert_eq!(data(&frames), vec!["payload"]);
}

#[test]
fn blank_line_without_data_dispatches_nothing() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"event: ping\n\n").is_empty());
    // The event name does not leak into the next frame.
    let frames = decoder.feed(b"data: x\n\n");
    assert!(frames[0].event.is_none());
}

#[test]
fn several_events_in_one_chunk() {
    let mut decoder = SseDecoder::new();
    let frames = decoder.feed(b"id: 1\ndata: a\n\nid: 2\ndata: b\n\n");
    assert_eq!(data(&frames), vec!["a", "b"]);
    assert_eq!(frames[1].id.as_deref(), Some("2"));
}

#[test]
fn field_without_space_after_colon() {
    let mut decoder = SseDecoder::new();
    let frames = decoder.feed(b"data:tight\n\n");
    assert_eq!(data(&frames), vec!["tight"]);
}

#[test]
fn reset_discards_partial_event() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"data: stale\ndata: par").is_empty());
    decoder.reset();
    let frames = decoder.feed(b"data: fresh\n\n");
    assert_eq!(data(&frames), vec!["fresh"]);
}

#[test]
fn last_event_id_survives_reset() {
    let mut decoder = SseDecoder::new();
    let frames = decoder.feed(b"id: 7\ndata: a\n\ndata: part");
    assert_eq!(frames[0].id.as_deref(), Some("7"));
    decoder.reset();
    assert_eq!(decoder.last_event_id(), Some("7"));

    // The id also carries over to later events that do not set one.
    let frames = decoder.feed(b"data: b\n\n");
    assert_eq!(data(&frames), vec!["b"]);
    assert_eq!(frames[0].id.as_deref(), Some("7"));
}

#[test]
fn oversized_line_is_discarded() {
    let mut decoder = SseDecoder::with_max_line(16);
    assert!(decoder.feed(b"data: ok-so-far\ndata: aaaaaaaaaaaaaaaaaaaaaaaa").is_empty());
    // The tail of the oversized line is skipped up to its newline, and the
    // partial event it belonged to is dropped.
    assert!(decoder.feed(b"aaaa\n\n").is_empty());
    let frames = decoder.feed(b"data: next\n\n");
    assert_eq!(data(&frames), vec!["next"]);
}
