use agmux_types::{AgentEvent, AgentKind, EventPayload};
use serde_json::Value;

use crate::cursor::schema::{
    CursorContentBlock, CursorRecord, CursorToolCallBody, CursorToolCallRecord,
};
use crate::normalizer::{Normalizer, file_events_from_command, unknown_event};

const KIND: AgentKind = AgentKind::Cursor;

pub struct CursorNormalizer;

impl CursorNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CursorNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for CursorNormalizer {
    fn kind(&self) -> AgentKind {
        KIND
    }

    fn normalize(&mut self, raw: &Value) -> Vec<AgentEvent> {
        let record: CursorRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(_) => return vec![unknown_event(KIND, raw)],
        };

        match record {
            CursorRecord::System(system) => {
                if system.subtype.as_deref() == Some("init") {
                    vec![AgentEvent::now(
                        KIND,
                        EventPayload::Init {
                            session_id: system.session_id,
                            model: system.model,
                        },
                    )]
                } else {
                    vec![unknown_event(KIND, raw)]
                }
            }
            CursorRecord::Assistant(assistant) => assistant
                .message
                .content
                .into_iter()
                .filter_map(|block| match block {
                    CursorContentBlock::Text { text } => Some(AgentEvent::now(
                        KIND,
                        EventPayload::Message {
                            content: text,
                            complete: true,
                        },
                    )),
                    CursorContentBlock::Other => None,
                })
                .collect(),
            CursorRecord::ToolCall(call) => normalize_tool_call(call),
            CursorRecord::Result(result) => vec![AgentEvent::now(
                KIND,
                EventPayload::Result {
                    status: result.subtype.unwrap_or_else(|| "success".to_string()),
                    duration_ms: result.duration_ms,
                    usage: result.usage,
                },
            )],
            CursorRecord::Unknown => vec![unknown_event(KIND, raw)],
        }
    }
}

fn normalize_tool_call(call: CursorToolCallRecord) -> Vec<AgentEvent> {
    // `started` records duplicate the later `completed` ones; only the
    // completed form is authoritative.
    if call.subtype.as_deref() != Some("completed") {
        return Vec::new();
    }

    let CursorToolCallBody {
        shell_tool_call,
        edit_tool_call,
        read_tool_call,
        delete_tool_call,
        list_tool_call,
    } = call.tool_call;

    if let Some(shell) = shell_tool_call {
        if let Some(command) = shell.args.get("command").and_then(Value::as_str) {
            let mut events = vec![AgentEvent::now(
                KIND,
                EventPayload::Bash {
                    tool: "shell".to_string(),
                    command: command.to_string(),
                },
            )];
            events.extend(file_events_from_command(KIND, "shell", command));
            return events;
        }
        return Vec::new();
    }

    if let Some(edit) = edit_tool_call {
        if let Some(path) = args_path(&edit.args) {
            return vec![AgentEvent::now(
                KIND,
                EventPayload::FileWrite {
                    tool: "edit".to_string(),
                    path,
                    command: None,
                },
            )];
        }
    }

    if let Some(read) = read_tool_call {
        if let Some(path) = args_path(&read.args) {
            return vec![AgentEvent::now(
                KIND,
                EventPayload::FileRead {
                    tool: "read".to_string(),
                    path,
                    command: None,
                },
            )];
        }
    }

    if let Some(delete) = delete_tool_call {
        if let Some(path) = args_path(&delete.args) {
            return vec![AgentEvent::now(
                KIND,
                EventPayload::FileDelete {
                    tool: "delete".to_string(),
                    path,
                    command: None,
                },
            )];
        }
    }

    if let Some(list) = list_tool_call {
        return vec![AgentEvent::now(
            KIND,
            EventPayload::DirectoryList {
                tool: "list".to_string(),
                path: args_path(&list.args),
            },
        )];
    }

    Vec::new()
}

fn args_path(args: &Value) -> Option<String> {
    args.get("path")
        .or_else(|| args.get("file_path"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
