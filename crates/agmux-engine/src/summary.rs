use agmux_types::{AgentEvent, EventPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retention bound for the bash command list
pub const MAX_BASH_COMMANDS: usize = 100;
/// Retention bound for error messages
pub const MAX_ERRORS: usize = 20;
/// How many trailing complete messages to keep
pub const LAST_MESSAGE_COUNT: usize = 5;

/// Deterministic fold of a canonical event sequence
///
/// Path lists are ordered sets in first-seen order; bounded lists keep the
/// most recent entries. Commands are stored verbatim here; display truncation
/// happens at the API boundary only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub files_created: Vec<String>,
    pub files_modified: Vec<String>,
    pub files_read: Vec<String>,
    pub files_deleted: Vec<String>,
    pub bash_commands: Vec<String>,
    pub tools_used: Vec<String>,
    pub tool_call_count: usize,
    pub errors: Vec<String>,
    pub last_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_message: Option<String>,
}

impl ActivitySummary {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Summary of a delta partition plus the cursor for the next poll
#[derive(Debug, Clone)]
pub struct Delta {
    pub summary: ActivitySummary,
    /// Max timestamp across the WHOLE log (not only the new partition), so
    /// polling with the returned cursor converges even when the partition
    /// was empty
    pub cursor: DateTime<Utc>,
}

/// Fold events into a summary with a single linear pass
pub fn summarize(events: &[AgentEvent]) -> ActivitySummary {
    let mut summary = ActivitySummary::default();

    for event in events {
        if let Some(tool) = event.payload.tool_name() {
            push_unique(&mut summary.tools_used, tool);
        }
        if event.payload.is_tool_activity() {
            summary.tool_call_count += 1;
        }

        match &event.payload {
            EventPayload::FileCreate { path, .. } => {
                push_unique(&mut summary.files_created, path);
            }
            EventPayload::FileWrite { path, .. } => {
                push_unique(&mut summary.files_modified, path);
            }
            EventPayload::FileRead { path, .. } => {
                push_unique(&mut summary.files_read, path);
            }
            EventPayload::FileDelete { path, .. } => {
                push_unique(&mut summary.files_deleted, path);
            }
            EventPayload::Bash { command, .. } => {
                push_bounded(&mut summary.bash_commands, command.clone(), MAX_BASH_COMMANDS);
            }
            EventPayload::Error { message } => {
                push_bounded(&mut summary.errors, message.clone(), MAX_ERRORS);
            }
            EventPayload::Message { content, complete } if *complete => {
                push_bounded(
                    &mut summary.last_messages,
                    content.clone(),
                    LAST_MESSAGE_COUNT,
                );
                summary.final_message = Some(content.clone());
            }
            _ => {}
        }
    }

    summary
}

/// Summarize only events strictly newer than `since`
///
/// `since = None` means epoch (everything is new). The cursor is the max
/// timestamp observed across all events; `now` when the log is empty.
pub fn delta(events: &[AgentEvent], since: Option<DateTime<Utc>>) -> Delta {
    let cursor = events
        .iter()
        .map(|e| e.timestamp)
        .max()
        .unwrap_or_else(Utc::now);

    let summary = match since {
        Some(since) => {
            let fresh: Vec<AgentEvent> = events
                .iter()
                .filter(|e| e.timestamp > since)
                .cloned()
                .collect();
            summarize(&fresh)
        }
        None => summarize(events),
    };

    Delta { summary, cursor }
}

fn push_unique(set: &mut Vec<String>, value: &str) {
    if !set.iter().any(|v| v == value) {
        set.push(value.to_string());
    }
}

fn push_bounded(list: &mut Vec<String>, value: String, bound: usize) {
    list.push(value);
    if list.len() > bound {
        let excess = list.len() - bound;
        list.drain(..excess);
    }
}
