use agmux_types::{AgentEvent, AgentKind, EventPayload};
use serde_json::Value;
use std::collections::HashMap;

use crate::claude::schema::{ClaudeRecord, ContentBlock};
use crate::normalizer::{Normalizer, file_events_from_command, unknown_event};

const KIND: AgentKind = AgentKind::Claude;

/// What a pending tool invocation was doing, keyed by the vendor tool id
///
/// Lets a later `tool_result` be projected as a specific canonical event
/// instead of a generic one. Entries are removed on match.
#[derive(Debug, Clone)]
struct PendingTool {
    tool: String,
    path: Option<String>,
    command: Option<String>,
}

pub struct ClaudeNormalizer {
    pending: HashMap<String, PendingTool>,
}

impl ClaudeNormalizer {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    fn on_tool_use(&mut self, id: Option<String>, name: String, input: Value) -> AgentEvent {
        if let Some(id) = id {
            self.pending.insert(
                id,
                PendingTool {
                    tool: name.clone(),
                    path: input
                        .get("file_path")
                        .or_else(|| input.get("path"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    command: input
                        .get("command")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            );
        }
        AgentEvent::now(
            KIND,
            EventPayload::ToolUse {
                tool: name,
                args: input,
            },
        )
    }

    fn on_tool_result(
        &mut self,
        tool_use_id: Option<String>,
        is_error: bool,
        content: Option<Value>,
    ) -> Vec<AgentEvent> {
        let pending = tool_use_id
            .as_deref()
            .and_then(|id| self.pending.remove(id));

        if is_error {
            let detail = content
                .as_ref()
                .map(render_result_text)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "tool reported an error".to_string());
            let message = match &pending {
                Some(p) => format!("{} failed: {}", p.tool, detail),
                None => detail,
            };
            return vec![AgentEvent::now(KIND, EventPayload::Error { message })];
        }

        match pending {
            Some(PendingTool {
                tool,
                command: Some(command),
                ..
            }) if is_shell_tool(&tool) => {
                let mut events = vec![AgentEvent::now(
                    KIND,
                    EventPayload::Bash {
                        tool: tool.clone(),
                        command: command.clone(),
                    },
                )];
                events.extend(file_events_from_command(KIND, &tool, &command));
                events
            }
            Some(PendingTool {
                tool,
                path: Some(path),
                ..
            }) if is_read_tool(&tool) => vec![AgentEvent::now(
                KIND,
                EventPayload::FileRead {
                    tool,
                    path,
                    command: None,
                },
            )],
            Some(PendingTool {
                tool,
                path: Some(path),
                ..
            }) if is_write_tool(&tool) => vec![AgentEvent::now(
                KIND,
                EventPayload::FileWrite {
                    tool,
                    path,
                    command: None,
                },
            )],
            _ => vec![AgentEvent::now(
                KIND,
                EventPayload::ToolResult {
                    tool_use_id,
                    success: true,
                },
            )],
        }
    }
}

impl Default for ClaudeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for ClaudeNormalizer {
    fn kind(&self) -> AgentKind {
        KIND
    }

    fn normalize(&mut self, raw: &Value) -> Vec<AgentEvent> {
        let record: ClaudeRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(_) => return vec![unknown_event(KIND, raw)],
        };

        match record {
            ClaudeRecord::System(system) => {
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
            ClaudeRecord::Assistant(assistant) => {
                let mut events = Vec::new();
                for block in assistant.message.content {
                    match block {
                        ContentBlock::Text { text } => {
                            events.push(AgentEvent::now(
                                KIND,
                                EventPayload::Message {
                                    content: text,
                                    complete: true,
                                },
                            ));
                        }
                        ContentBlock::ToolUse { id, name, input } => {
                            events.push(self.on_tool_use(id, name, input));
                        }
                        ContentBlock::ToolResult { .. } | ContentBlock::Other => {}
                    }
                }
                events
            }
            ClaudeRecord::User(user) => {
                let mut events = Vec::new();
                for block in user.message.content {
                    if let ContentBlock::ToolResult {
                        tool_use_id,
                        is_error,
                        content,
                    } = block
                    {
                        events.extend(self.on_tool_result(tool_use_id, is_error, content));
                    }
                }
                events
            }
            ClaudeRecord::Thinking(thinking) => {
                let text = thinking.text.unwrap_or_default();
                let complete = thinking.subtype.as_deref() == Some("completed");
                // Empty deltas carry no information; suppress them.
                if text.is_empty() && !complete {
                    return Vec::new();
                }
                vec![AgentEvent::now(
                    KIND,
                    EventPayload::Thinking {
                        content: text,
                        complete,
                    },
                )]
            }
            ClaudeRecord::Result(result) => vec![AgentEvent::now(
                KIND,
                EventPayload::Result {
                    status: result.subtype.unwrap_or_else(|| "success".to_string()),
                    duration_ms: result.duration_ms,
                    usage: result.usage,
                },
            )],
            ClaudeRecord::Unknown => vec![unknown_event(KIND, raw)],
        }
    }
}

fn is_shell_tool(name: &str) -> bool {
    matches!(name, "Bash" | "BashOutput" | "Shell")
}

fn is_read_tool(name: &str) -> bool {
    matches!(name, "Read" | "NotebookRead")
}

fn is_write_tool(name: &str) -> bool {
    matches!(name, "Write" | "Edit" | "MultiEdit" | "NotebookEdit")
}

/// Flatten a tool-result content value (string or content-block list) to text
fn render_result_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
