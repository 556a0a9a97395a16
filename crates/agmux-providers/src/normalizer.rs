use agmux_types::{AgentEvent, AgentKind, EventPayload};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Raw-record to canonical-event translation
///
/// One instance per running agent. Implementations are total: any input shape
/// yields zero or more events and never an error. Normalizers may keep local
/// state (e.g. a tool-id table for pairing `tool_use` with a later
/// `tool_result`); state never crosses agents.
pub trait Normalizer: Send {
    fn kind(&self) -> AgentKind;

    /// Translate one raw vendor record into canonical events.
    fn normalize(&mut self, raw: &Value) -> Vec<AgentEvent>;
}

/// Timestamp from a raw record field, falling back to the wall clock
pub(crate) fn timestamp_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Wrap an unrecognized record as a single `unknown` event
pub(crate) fn unknown_event(kind: AgentKind, raw: &Value) -> AgentEvent {
    AgentEvent::now(kind, EventPayload::Unknown { raw: raw.clone() })
}

/// File events synthesized from a shell command's text
///
/// Emitted alongside every `bash` event; each carries just the inferred path
/// plus the originating command for traceability.
pub(crate) fn file_events_from_command(
    kind: AgentKind,
    tool: &str,
    command: &str,
) -> Vec<AgentEvent> {
    use crate::shellfs::{InferredFileOp, ShellFileOp, infer_file_ops};

    infer_file_ops(command)
        .into_iter()
        .map(|InferredFileOp { op, path }| {
            let tool = tool.to_string();
            let command = Some(command.to_string());
            let payload = match op {
                ShellFileOp::Read => EventPayload::FileRead {
                    tool,
                    path,
                    command,
                },
                ShellFileOp::Write => EventPayload::FileWrite {
                    tool,
                    path,
                    command,
                },
                ShellFileOp::Create => EventPayload::FileCreate {
                    tool,
                    path,
                    command,
                },
                ShellFileOp::Delete => EventPayload::FileDelete {
                    tool,
                    path,
                    command,
                },
            };
            AgentEvent::now(kind, payload)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_timestamps_are_honored() {
        let ts = timestamp_or_now(Some("2026-01-15T10:30:00Z"));
        assert_eq!(ts.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn garbage_timestamps_fall_back_to_now() {
        let before = Utc::now();
        let ts = timestamp_or_now(Some("yesterday-ish"));
        assert!(ts >= before);
    }
}
