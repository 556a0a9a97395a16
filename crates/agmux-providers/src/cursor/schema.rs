use serde::Deserialize;
use serde_json::Value;

/// Raw records from `cursor-agent --output-format stream-json`
///
/// The envelope mirrors the claude stream format; tool activity arrives as
/// `tool_call` records whose body names exactly one `*ToolCall` variant.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CursorRecord {
    System(CursorSystem),
    Assistant(CursorAssistant),
    ToolCall(CursorToolCallRecord),
    Result(CursorResult),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CursorSystem {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CursorAssistant {
    #[serde(default)]
    pub message: CursorMessageBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CursorMessageBody {
    #[serde(default)]
    pub content: Vec<CursorContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum CursorContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CursorToolCallRecord {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub tool_call: CursorToolCallBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CursorToolCallBody {
    #[serde(default)]
    pub shell_tool_call: Option<CursorToolArgs>,
    #[serde(default)]
    pub edit_tool_call: Option<CursorToolArgs>,
    #[serde(default)]
    pub read_tool_call: Option<CursorToolArgs>,
    #[serde(default)]
    pub delete_tool_call: Option<CursorToolArgs>,
    #[serde(default)]
    pub list_tool_call: Option<CursorToolArgs>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CursorToolArgs {
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CursorResult {
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub usage: Option<Value>,
}
