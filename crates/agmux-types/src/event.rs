use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentKind;

/// One normalized event in an agent's append-only log
///
/// The envelope carries the producing kind and a UTC timestamp; the payload is
/// flattened so the on-disk record reads as a single flat object tagged by
/// `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub agent: AgentKind,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl AgentEvent {
    pub fn new(agent: AgentKind, timestamp: DateTime<Utc>, payload: EventPayload) -> Self {
        Self {
            agent,
            timestamp,
            payload,
        }
    }

    pub fn now(agent: AgentKind, payload: EventPayload) -> Self {
        Self::new(agent, Utc::now(), payload)
    }

    pub fn priority(&self) -> EventPriority {
        self.payload.priority()
    }
}

/// Canonical event payload, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Init {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    TurnStart,
    Message {
        content: String,
        complete: bool,
    },
    Thinking {
        content: String,
        complete: bool,
    },
    ToolUse {
        tool: String,
        args: Value,
    },
    Bash {
        tool: String,
        command: String,
    },
    FileRead {
        tool: String,
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    FileWrite {
        tool: String,
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    FileCreate {
        tool: String,
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    FileDelete {
        tool: String,
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    DirectoryList {
        tool: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_use_id: Option<String>,
        success: bool,
    },
    Error {
        message: String,
    },
    Result {
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Value>,
    },
    Unknown {
        raw: Value,
    },
}

impl EventPayload {
    /// Wire name of the payload's `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::Init { .. } => "init",
            EventPayload::TurnStart => "turn_start",
            EventPayload::Message { .. } => "message",
            EventPayload::Thinking { .. } => "thinking",
            EventPayload::ToolUse { .. } => "tool_use",
            EventPayload::Bash { .. } => "bash",
            EventPayload::FileRead { .. } => "file_read",
            EventPayload::FileWrite { .. } => "file_write",
            EventPayload::FileCreate { .. } => "file_create",
            EventPayload::FileDelete { .. } => "file_delete",
            EventPayload::DirectoryList { .. } => "directory_list",
            EventPayload::ToolResult { .. } => "tool_result",
            EventPayload::Error { .. } => "error",
            EventPayload::Result { .. } => "result",
            EventPayload::Unknown { .. } => "unknown",
        }
    }

    /// Name of the tool behind this event, when there is one
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            EventPayload::ToolUse { tool, .. }
            | EventPayload::Bash { tool, .. }
            | EventPayload::FileRead { tool, .. }
            | EventPayload::FileWrite { tool, .. }
            | EventPayload::FileCreate { tool, .. }
            | EventPayload::FileDelete { tool, .. }
            | EventPayload::DirectoryList { tool, .. } => Some(tool),
            _ => None,
        }
    }

    /// True for `tool_use`, `bash`, and the file-op family
    pub fn is_tool_activity(&self) -> bool {
        matches!(
            self,
            EventPayload::ToolUse { .. }
                | EventPayload::Bash { .. }
                | EventPayload::FileRead { .. }
                | EventPayload::FileWrite { .. }
                | EventPayload::FileCreate { .. }
                | EventPayload::FileDelete { .. }
                | EventPayload::DirectoryList { .. }
        )
    }

    pub fn priority(&self) -> EventPriority {
        match self {
            EventPayload::Init { .. }
            | EventPayload::Result { .. }
            | EventPayload::Error { .. }
            | EventPayload::FileWrite { .. }
            | EventPayload::FileCreate { .. }
            | EventPayload::FileDelete { .. } => EventPriority::Critical,
            EventPayload::ToolUse { .. }
            | EventPayload::Bash { .. }
            | EventPayload::FileRead { .. }
            | EventPayload::DirectoryList { .. }
            | EventPayload::ToolResult { .. } => EventPriority::Important,
            EventPayload::Message { complete, .. } => {
                if *complete {
                    EventPriority::Important
                } else {
                    EventPriority::Verbose
                }
            }
            EventPayload::Thinking { .. }
            | EventPayload::TurnStart
            | EventPayload::Unknown { .. } => EventPriority::Verbose,
        }
    }
}

/// Filtering class for raw-event requests
///
/// Default responses never include `Verbose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPriority {
    Verbose,
    Important,
    Critical,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serializes_flat_with_type_tag() {
        let event = AgentEvent::now(
            AgentKind::Codex,
            EventPayload::Bash {
                tool: "shell".into(),
                command: "ls -la".into(),
            },
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "bash");
        assert_eq!(value["agent"], "codex");
        assert_eq!(value["command"], "ls -la");
        assert!(value["timestamp"].is_string());

        let back: AgentEvent = serde_json::from_value(value).unwrap();
        match back.payload {
            EventPayload::Bash { command, .. } => assert_eq!(command, "ls -la"),
            other => panic!("wrong payload: {:?}", other),
        }
    }

    #[test]
    fn unknown_round_trips_raw_payload() {
        let raw = json!({"type": "galactic_storm", "lumens": 9000});
        let event = AgentEvent::now(
            AgentKind::Gemini,
            EventPayload::Unknown { raw: raw.clone() },
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "unknown");
        assert_eq!(value["raw"], raw);
    }

    #[test]
    fn priority_classification() {
        let critical = EventPayload::FileWrite {
            tool: "Write".into(),
            path: "src/main.rs".into(),
            command: None,
        };
        assert_eq!(critical.priority(), EventPriority::Critical);

        let complete = EventPayload::Message {
            content: "done".into(),
            complete: true,
        };
        assert_eq!(complete.priority(), EventPriority::Important);

        let partial = EventPayload::Message {
            content: "do".into(),
            complete: false,
        };
        assert_eq!(partial.priority(), EventPriority::Verbose);

        assert!(EventPriority::Critical > EventPriority::Important);
        assert!(EventPriority::Important > EventPriority::Verbose);
    }
}
