use serde::Deserialize;
use serde_json::Value;

/// Raw records from `codex exec --json`
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum CodexRecord {
    #[serde(rename = "thread.started")]
    ThreadStarted {
        #[serde(default)]
        thread_id: Option<String>,
    },
    #[serde(rename = "turn.started")]
    TurnStarted,
    #[serde(rename = "item.completed")]
    ItemCompleted {
        #[serde(default)]
        item: CodexItem,
    },
    #[serde(rename = "turn.completed")]
    TurnCompleted {
        #[serde(default)]
        usage: Option<Value>,
    },
    #[serde(rename = "turn.failed")]
    TurnFailed {
        #[serde(default)]
        error: Option<Value>,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CodexItem {
    AgentMessage {
        #[serde(default)]
        text: String,
    },
    Reasoning {
        #[serde(default)]
        text: String,
    },
    CommandExecution {
        #[serde(default)]
        command: String,
    },
    FileChange {
        #[serde(default)]
        changes: Vec<CodexFileChange>,
    },
    ToolCall {
        #[serde(default)]
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    #[serde(other)]
    #[default]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CodexFileChange {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub kind: Option<String>,
}
