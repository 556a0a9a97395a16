use serde::Deserialize;
use serde_json::Value;

/// Raw records from `gemini --output-format stream-json`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum GeminiRecord {
    Message(GeminiMessage),
    ToolCall(GeminiToolCall),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
    /// True for streaming fragments; the terminal chunk omits it
    #[serde(default)]
    pub delta: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiToolCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}
