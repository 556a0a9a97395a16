use agmux_engine::{delta, display_command, summarize};
use agmux_types::{AgentEvent, AgentKind, EventPayload};
use chrono::{DateTime, Duration, Utc};

fn at(base: DateTime<Utc>, secs: i64, payload: EventPayload) -> AgentEvent {
    AgentEvent::new(AgentKind::Codex, base + Duration::seconds(secs), payload)
}

fn sample_log(base: DateTime<Utc>) -> Vec<AgentEvent> {
    vec![
        at(
            base,
            0,
            EventPayload::Init {
                session_id: Some("t1".into()),
                model: None,
            },
        ),
        at(
            base,
            1,
            EventPayload::Message {
                content: "working".into(),
                complete: true,
            },
        ),
        at(
            base,
            2,
            EventPayload::FileCreate {
                tool: "write_file".into(),
                path: "src/auth.ts".into(),
                command: None,
            },
        ),
        at(
            base,
            3,
            EventPayload::Bash {
                tool: "shell".into(),
                command: "cargo test".into(),
            },
        ),
        at(
            base,
            4,
            EventPayload::FileWrite {
                tool: "apply_patch".into(),
                path: "src/auth.ts".into(),
                command: None,
            },
        ),
        at(
            base,
            5,
            EventPayload::Message {
                content: "all green".into(),
                complete: true,
            },
        ),
        at(
            base,
            6,
            EventPayload::Result {
                status: "success".into(),
                duration_ms: Some(6000),
                usage: None,
            },
        ),
    ]
}

#[test]
fn full_summary_accumulates_every_field() {
    let base = Utc::now();
    let summary = summarize(&sample_log(base));

    assert_eq!(summary.files_created, vec!["src/auth.ts"]);
    assert_eq!(summary.files_modified, vec!["src/auth.ts"]);
    assert_eq!(summary.bash_commands, vec!["cargo test"]);
    assert_eq!(summary.tool_call_count, 3);
    assert!(summary.tools_used.contains(&"shell".to_string()));
    assert_eq!(summary.last_messages, vec!["working", "all green"]);
    assert_eq!(summary.final_message.as_deref(), Some("all green"));
    assert!(!summary.has_errors());
}

#[test]
fn delta_covers_only_the_new_partition() {
    let base = Utc::now();
    let log = sample_log(base);

    // Cursor after the file_create: only bash, write, message, result are new
    let d = delta(&log, Some(base + Duration::seconds(2)));
    assert!(d.summary.files_created.is_empty());
    assert_eq!(d.summary.files_modified, vec!["src/auth.ts"]);
    assert_eq!(d.summary.bash_commands, vec!["cargo test"]);
    assert_eq!(d.summary.last_messages, vec!["all green"]);

    // Cursor is the max timestamp across the whole log
    assert_eq!(d.cursor, base + Duration::seconds(6));
}

#[test]
fn delta_with_cursor_at_head_is_empty_but_cursor_advances() {
    let base = Utc::now();
    let log = sample_log(base);

    let first = delta(&log, None);
    let second = delta(&log, Some(first.cursor));

    assert!(second.summary.files_created.is_empty());
    assert!(second.summary.bash_commands.is_empty());
    assert!(second.summary.last_messages.is_empty());
    assert_eq!(second.cursor, first.cursor);
}

#[test]
fn deltas_shrink_monotonically_with_the_cursor() {
    let base = Utc::now();
    let log = sample_log(base);

    let earlier = delta(&log, Some(base + Duration::seconds(1)));
    let later = delta(&log, Some(base + Duration::seconds(4)));

    for path in &later.summary.files_modified {
        assert!(earlier.summary.files_modified.contains(path));
    }
    for cmd in &later.summary.bash_commands {
        assert!(earlier.summary.bash_commands.contains(cmd));
    }
    assert!(later.summary.tool_call_count <= earlier.summary.tool_call_count);
}

#[test]
fn union_of_two_deltas_equals_the_full_summary() {
    let base = Utc::now();
    let log = sample_log(base);
    let cut = base + Duration::seconds(3);

    let head: Vec<AgentEvent> = log.iter().filter(|e| e.timestamp <= cut).cloned().collect();
    let first = summarize(&head);
    let second = delta(&log, Some(cut)).summary;
    let full = summarize(&log);

    let mut created = first.files_created.clone();
    created.extend(second.files_created.clone());
    created.dedup();
    assert_eq!(created, full.files_created);

    let mut commands = first.bash_commands.clone();
    commands.extend(second.bash_commands.clone());
    assert_eq!(commands, full.bash_commands);
}

#[test]
fn incomplete_messages_never_reach_the_summary() {
    let base = Utc::now();
    let events = vec![
        at(
            base,
            0,
            EventPayload::Message {
                content: "par".into(),
                complete: false,
            },
        ),
        at(
            base,
            1,
            EventPayload::Message {
                content: "partial done".into(),
                complete: true,
            },
        ),
    ];
    let summary = summarize(&events);
    assert_eq!(summary.last_messages, vec!["partial done"]);
}

#[test]
fn errors_are_collected_and_flagged() {
    let base = Utc::now();
    let events = vec![at(
        base,
        0,
        EventPayload::Error {
            message: "spawn failed".into(),
        },
    )];
    let summary = summarize(&events);
    assert!(summary.has_errors());
    assert_eq!(summary.errors, vec!["spawn failed"]);
}

#[test]
fn display_truncation_is_cosmetic_only() {
    let long = format!("echo {}", "y".repeat(300));
    let base = Utc::now();
    let events = vec![at(
        base,
        0,
        EventPayload::Bash {
            tool: "shell".into(),
            command: long.clone(),
        },
    )];

    // Stored verbatim, truncated only when rendered
    let summary = summarize(&events);
    assert_eq!(summary.bash_commands[0], long);
    assert_eq!(display_command(&long).chars().count(), 120);
}
