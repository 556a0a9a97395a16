use agmux_types::{AgentEvent, AgentKind, EventPayload};
use serde_json::Value;

use crate::gemini::schema::{GeminiRecord, GeminiToolCall};
use crate::normalizer::{Normalizer, file_events_from_command, timestamp_or_now, unknown_event};

const KIND: AgentKind = AgentKind::Gemini;

const WRITE_TOOLS: &[&str] = &["write_file", "replace", "edit", "create_file"];
const READ_TOOLS: &[&str] = &["read_file", "read_many_files"];
const SHELL_TOOLS: &[&str] = &["run_shell_command", "shell", "execute_command"];

pub struct GeminiNormalizer;

impl GeminiNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GeminiNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for GeminiNormalizer {
    fn kind(&self) -> AgentKind {
        KIND
    }

    fn normalize(&mut self, raw: &Value) -> Vec<AgentEvent> {
        let record: GeminiRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(_) => return vec![unknown_event(KIND, raw)],
        };

        match record {
            GeminiRecord::Message(message) => {
                // Only assistant output is part of the canonical stream; the
                // prompt echo and system chatter are not.
                if message.role.as_deref() != Some("assistant") {
                    return Vec::new();
                }
                vec![AgentEvent::new(
                    KIND,
                    timestamp_or_now(message.timestamp.as_deref()),
                    EventPayload::Message {
                        content: message.content,
                        complete: !message.delta,
                    },
                )]
            }
            GeminiRecord::ToolCall(call) => normalize_tool_call(call),
            GeminiRecord::Unknown => vec![unknown_event(KIND, raw)],
        }
    }
}

fn normalize_tool_call(call: GeminiToolCall) -> Vec<AgentEvent> {
    let GeminiToolCall {
        name,
        args,
        timestamp,
    } = call;
    let ts = timestamp_or_now(timestamp.as_deref());

    if WRITE_TOOLS.contains(&name.as_str()) {
        if let Some(path) = arg_path(&args) {
            return vec![AgentEvent::new(
                KIND,
                ts,
                EventPayload::FileWrite {
                    tool: name,
                    path,
                    command: None,
                },
            )];
        }
    } else if READ_TOOLS.contains(&name.as_str()) {
        if let Some(path) = arg_path(&args) {
            return vec![AgentEvent::new(
                KIND,
                ts,
                EventPayload::FileRead {
                    tool: name,
                    path,
                    command: None,
                },
            )];
        }
    } else if SHELL_TOOLS.contains(&name.as_str()) {
        if let Some(command) = args.get("command").and_then(Value::as_str) {
            let mut events = vec![AgentEvent::new(
                KIND,
                ts,
                EventPayload::Bash {
                    tool: name.clone(),
                    command: command.to_string(),
                },
            )];
            events.extend(file_events_from_command(KIND, &name, command));
            return events;
        }
    }

    vec![AgentEvent::new(
        KIND,
        ts,
        EventPayload::ToolUse { tool: name, args },
    )]
}

/// Path argument under any of the names gemini tools use
fn arg_path(args: &Value) -> Option<String> {
    args.get("path")
        .or_else(|| args.get("file_path"))
        .or_else(|| args.get("absolute_path"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            args.get("paths")
                .and_then(Value::as_array)
                .and_then(|paths| paths.first())
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}
