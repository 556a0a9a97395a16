use agmux_types::{AgentEvent, AgentKind, EventPayload};
use serde_json::Value;

use crate::codex::schema::{CodexItem, CodexRecord};
use crate::normalizer::{Normalizer, file_events_from_command, unknown_event};

const KIND: AgentKind = AgentKind::Codex;
const SHELL_TOOL: &str = "shell";
const PATCH_TOOL: &str = "apply_patch";

pub struct CodexNormalizer;

impl CodexNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CodexNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for CodexNormalizer {
    fn kind(&self) -> AgentKind {
        KIND
    }

    fn normalize(&mut self, raw: &Value) -> Vec<AgentEvent> {
        let record: CodexRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(_) => return vec![unknown_event(KIND, raw)],
        };

        match record {
            CodexRecord::ThreadStarted { thread_id } => vec![AgentEvent::now(
                KIND,
                EventPayload::Init {
                    session_id: thread_id,
                    model: None,
                },
            )],
            CodexRecord::TurnStarted => vec![AgentEvent::now(KIND, EventPayload::TurnStart)],
            CodexRecord::ItemCompleted { item } => normalize_item(item, raw),
            CodexRecord::TurnCompleted { usage } => vec![AgentEvent::now(
                KIND,
                EventPayload::Result {
                    status: "success".to_string(),
                    duration_ms: None,
                    usage,
                },
            )],
            CodexRecord::TurnFailed { error } => {
                let message = error
                    .as_ref()
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("turn failed")
                    .to_string();
                vec![
                    AgentEvent::now(KIND, EventPayload::Error { message }),
                    AgentEvent::now(
                        KIND,
                        EventPayload::Result {
                            status: "error".to_string(),
                            duration_ms: None,
                            usage: None,
                        },
                    ),
                ]
            }
            CodexRecord::Error { message } => {
                vec![AgentEvent::now(KIND, EventPayload::Error { message })]
            }
            CodexRecord::Unknown => vec![unknown_event(KIND, raw)],
        }
    }
}

fn normalize_item(item: CodexItem, raw: &Value) -> Vec<AgentEvent> {
    match item {
        CodexItem::AgentMessage { text } => vec![AgentEvent::now(
            KIND,
            EventPayload::Message {
                content: text,
                complete: true,
            },
        )],
        CodexItem::Reasoning { text } => vec![AgentEvent::now(
            KIND,
            EventPayload::Thinking {
                content: text,
                complete: true,
            },
        )],
        CodexItem::CommandExecution { command } => {
            let mut events = vec![AgentEvent::now(
                KIND,
                EventPayload::Bash {
                    tool: SHELL_TOOL.to_string(),
                    command: command.clone(),
                },
            )];
            events.extend(file_events_from_command(KIND, SHELL_TOOL, &command));
            events
        }
        CodexItem::FileChange { changes } => changes
            .into_iter()
            .filter(|c| !c.path.is_empty())
            .map(|change| {
                let tool = PATCH_TOOL.to_string();
                let payload = match change.kind.as_deref() {
                    Some("add") => EventPayload::FileCreate {
                        tool,
                        path: change.path,
                        command: None,
                    },
                    Some("delete") => EventPayload::FileDelete {
                        tool,
                        path: change.path,
                        command: None,
                    },
                    _ => EventPayload::FileWrite {
                        tool,
                        path: change.path,
                        command: None,
                    },
                };
                AgentEvent::now(KIND, payload)
            })
            .collect(),
        CodexItem::ToolCall { name, arguments } => normalize_tool_call(name, arguments),
        CodexItem::Other => vec![unknown_event(KIND, raw)],
    }
}

/// Map a named tool call onto the file/bash families, falling back to a
/// generic `tool_use`
fn normalize_tool_call(name: String, arguments: Value) -> Vec<AgentEvent> {
    let path = arguments
        .get("path")
        .or_else(|| arguments.get("file_path"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let command = arguments
        .get("command")
        .and_then(Value::as_str)
        .map(str::to_string);

    match name.as_str() {
        "write_file" | "edit_file" => {
            if let Some(path) = path {
                return vec![AgentEvent::now(
                    KIND,
                    EventPayload::FileWrite {
                        tool: name,
                        path,
                        command: None,
                    },
                )];
            }
        }
        "create_file" => {
            if let Some(path) = path {
                return vec![AgentEvent::now(
                    KIND,
                    EventPayload::FileCreate {
                        tool: name,
                        path,
                        command: None,
                    },
                )];
            }
        }
        "read_file" | "view" => {
            if let Some(path) = path {
                return vec![AgentEvent::now(
                    KIND,
                    EventPayload::FileRead {
                        tool: name,
                        path,
                        command: None,
                    },
                )];
            }
        }
        "shell" | "shell_command" | "bash" => {
            if let Some(command) = command {
                let mut events = vec![AgentEvent::now(
                    KIND,
                    EventPayload::Bash {
                        tool: name.clone(),
                        command: command.clone(),
                    },
                )];
                events.extend(file_events_from_command(KIND, &name, &command));
                return events;
            }
        }
        _ => {}
    }

    vec![AgentEvent::now(
        KIND,
        EventPayload::ToolUse {
            tool: name,
            args: arguments,
        },
    )]
}
