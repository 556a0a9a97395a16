use agmux_types::{AgentEvent, AgentKind, EventPayload};
use serde_json::Value;

use crate::normalizer::{Normalizer, file_events_from_command, unknown_event};
use crate::opencode::schema::{OpencodePart, OpencodeRecord};

const KIND: AgentKind = AgentKind::Opencode;

pub struct OpencodeNormalizer;

impl OpencodeNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpencodeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for OpencodeNormalizer {
    fn kind(&self) -> AgentKind {
        KIND
    }

    fn normalize(&mut self, raw: &Value) -> Vec<AgentEvent> {
        let record: OpencodeRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(_) => return vec![unknown_event(KIND, raw)],
        };

        match record {
            OpencodeRecord::StepStart { part } => vec![AgentEvent::now(
                KIND,
                EventPayload::Init {
                    session_id: part.session_id,
                    model: None,
                },
            )],
            OpencodeRecord::StepFinish { part } => {
                let status = if part.reason.as_deref() == Some("stop") {
                    "success"
                } else {
                    "error"
                };
                vec![AgentEvent::now(
                    KIND,
                    EventPayload::Result {
                        status: status.to_string(),
                        duration_ms: None,
                        usage: None,
                    },
                )]
            }
            OpencodeRecord::ToolUse { part } => normalize_tool_part(part),
            OpencodeRecord::Text { part } => vec![AgentEvent::now(
                KIND,
                EventPayload::Message {
                    content: part.text.unwrap_or_default(),
                    complete: true,
                },
            )],
            OpencodeRecord::Reasoning { part } => vec![AgentEvent::now(
                KIND,
                EventPayload::Thinking {
                    content: part.text.unwrap_or_default(),
                    complete: true,
                },
            )],
            OpencodeRecord::Unknown => vec![unknown_event(KIND, raw)],
        }
    }
}

fn normalize_tool_part(part: OpencodePart) -> Vec<AgentEvent> {
    // Pending/running states are progress chatter; the completed state (or a
    // record without one) carries the final input.
    if matches!(part.state.status.as_deref(), Some("pending") | Some("running")) {
        return Vec::new();
    }

    let tool = part.tool.unwrap_or_default();
    let input = part.state.input;
    let path = input
        .get("filePath")
        .or_else(|| input.get("path"))
        .and_then(Value::as_str)
        .map(str::to_string);

    match tool.as_str() {
        "write" => {
            if let Some(path) = path {
                return vec![AgentEvent::now(
                    KIND,
                    EventPayload::FileCreate {
                        tool,
                        path,
                        command: None,
                    },
                )];
            }
        }
        "edit" | "patch" => {
            if let Some(path) = path {
                return vec![AgentEvent::now(
                    KIND,
                    EventPayload::FileWrite {
                        tool,
                        path,
                        command: None,
                    },
                )];
            }
        }
        "read" => {
            if let Some(path) = path {
                return vec![AgentEvent::now(
                    KIND,
                    EventPayload::FileRead {
                        tool,
                        path,
                        command: None,
                    },
                )];
            }
        }
        "bash" | "shell" => {
            if let Some(command) = input.get("command").and_then(Value::as_str) {
                let mut events = vec![AgentEvent::now(
                    KIND,
                    EventPayload::Bash {
                        tool: tool.clone(),
                        command: command.to_string(),
                    },
                )];
                events.extend(file_events_from_command(KIND, &tool, command));
                return events;
            }
        }
        "ls" | "list" | "glob" => {
            return vec![AgentEvent::now(
                KIND,
                EventPayload::DirectoryList { tool, path },
            )];
        }
        _ => {}
    }

    vec![AgentEvent::now(
        KIND,
        EventPayload::ToolUse { tool, args: input },
    )]
}
