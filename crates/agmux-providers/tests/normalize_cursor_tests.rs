mod common;

use agmux_providers::normalizer_for;
use agmux_types::{AgentKind, EventPayload};
use common::normalize_fixture;
use serde_json::json;

#[test]
fn started_tool_calls_are_skipped_completed_projected() {
    let events = normalize_fixture(AgentKind::Cursor, "cursor/simple_session.jsonl");

    // Exactly one bash event despite the started/completed pair
    let bash_count = events
        .iter()
        .filter(|e| matches!(&e.payload, EventPayload::Bash { .. }))
        .count();
    assert_eq!(bash_count, 1);

    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::FileWrite { path, .. } if path == "out.txt"
    )));
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::FileRead { path, .. } if path == "large.log"
    )));
}

#[test]
fn init_and_result_bracket_the_session() {
    let events = normalize_fixture(AgentKind::Cursor, "cursor/simple_session.jsonl");
    assert!(matches!(
        &events.first().unwrap().payload,
        EventPayload::Init { session_id: Some(id), .. } if id == "cur-1"
    ));
    assert!(matches!(
        &events.last().unwrap().payload,
        EventPayload::Result { status, .. } if status == "success"
    ));
}

#[test]
fn edit_tool_call_maps_to_file_write() {
    let mut normalizer = normalizer_for(AgentKind::Cursor);
    let raw = json!({"type": "tool_call", "subtype": "completed",
        "tool_call": {"editToolCall": {"args": {"path": "src/ui.tsx"}}}});
    let events = normalizer.normalize(&raw);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0].payload,
        EventPayload::FileWrite { path, .. } if path == "src/ui.tsx"
    ));
}

#[test]
fn delete_and_list_tool_calls_project() {
    let mut normalizer = normalizer_for(AgentKind::Cursor);

    let events = normalizer.normalize(&json!({"type": "tool_call", "subtype": "completed",
        "tool_call": {"deleteToolCall": {"args": {"path": "obsolete.md"}}}}));
    assert!(matches!(
        &events[0].payload,
        EventPayload::FileDelete { path, .. } if path == "obsolete.md"
    ));

    let events = normalizer.normalize(&json!({"type": "tool_call", "subtype": "completed",
        "tool_call": {"listToolCall": {"args": {"path": "src"}}}}));
    assert!(matches!(
        &events[0].payload,
        EventPayload::DirectoryList { path: Some(p), .. } if p == "src"
    ));
}

#[test]
fn assistant_text_is_a_complete_message() {
    let events = normalize_fixture(AgentKind::Cursor, "cursor/simple_session.jsonl");
    assert!(events.iter().any(|e| matches!(
        &e.payload,
        EventPayload::Message { content, complete: true } if content == "copied the log"
    )));
}
