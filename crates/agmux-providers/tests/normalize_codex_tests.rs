mod common;

use agmux_providers::normalizer_for;
use agmux_types::{AgentKind, EventPayload};
use common::normalize_fixture;
use serde_json::json;

#[test]
fn simple_session_produces_expected_stream() {
    let events = normalize_fixture(AgentKind::Codex, "codex/simple_session.jsonl");

    // init, turn_start, message, file_write, bash + read + write, result
    assert_eq!(events.len(), 8);
    for event in &events {
        assert_eq!(event.agent, AgentKind::Codex);
    }

    match &events[0].payload {
        EventPayload::Init { session_id, .. } => {
            assert_eq!(session_id.as_deref(), Some("t1"));
        }
        other => panic!("expected init, got {:?}", other),
    }
    assert!(matches!(events[1].payload, EventPayload::TurnStart));
    match &events[2].payload {
        EventPayload::Message { content, complete } => {
            assert_eq!(content, "working");
            assert!(complete);
        }
        other => panic!("expected message, got {:?}", other),
    }
}

#[test]
fn named_tool_call_maps_to_file_write() {
    let events = normalize_fixture(AgentKind::Codex, "codex/simple_session.jsonl");
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::FileWrite { path, .. } if path == "src/auth.ts"
    )));
}

#[test]
fn command_execution_synthesizes_file_events() {
    let events = normalize_fixture(AgentKind::Codex, "codex/simple_session.jsonl");

    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::Bash { command, .. } if command == "cat large.log > out.txt"
    )));
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::FileRead { path, .. } if path == "large.log"
    )));
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::FileWrite { path, command, .. }
            if path == "out.txt" && command.is_some()
    )));
}

#[test]
fn turn_completed_carries_usage() {
    let events = normalize_fixture(AgentKind::Codex, "codex/simple_session.jsonl");
    match &events.last().unwrap().payload {
        EventPayload::Result { status, usage, .. } => {
            assert_eq!(status, "success");
            let usage = usage.as_ref().expect("usage present");
            assert_eq!(usage["input_tokens"], 100);
            assert_eq!(usage["output_tokens"], 20);
        }
        other => panic!("expected result, got {:?}", other),
    }
}

#[test]
fn unlisted_record_becomes_unknown() {
    let mut normalizer = normalizer_for(AgentKind::Codex);
    let raw = json!({"type": "galactic_storm", "lumens": 9000});
    let events = normalizer.normalize(&raw);
    assert_eq!(events.len(), 1);
    match &events[0].payload {
        EventPayload::Unknown { raw: echoed } => assert_eq!(echoed, &raw),
        other => panic!("expected unknown, got {:?}", other),
    }
}

#[test]
fn turn_failed_emits_error_then_result() {
    let mut normalizer = normalizer_for(AgentKind::Codex);
    let raw = json!({"type": "turn.failed", "error": {"message": "rate limited"}});
    let events = normalizer.normalize(&raw);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0].payload,
        EventPayload::Error { message } if message == "rate limited"
    ));
    assert!(matches!(
        &events[1].payload,
        EventPayload::Result { status, .. } if status == "error"
    ));
}
