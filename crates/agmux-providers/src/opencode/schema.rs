use serde::Deserialize;
use serde_json::Value;

/// Raw records from `opencode run --format json`
///
/// Every record wraps a `part`; older builds hyphenate the step markers, so
/// both spellings are accepted.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum OpencodeRecord {
    #[serde(rename = "step_start", alias = "step-start")]
    StepStart {
        #[serde(default)]
        part: OpencodePart,
    },
    #[serde(rename = "step_finish", alias = "step-finish")]
    StepFinish {
        #[serde(default)]
        part: OpencodePart,
    },
    #[serde(rename = "tool_use", alias = "tool")]
    ToolUse {
        #[serde(default)]
        part: OpencodePart,
    },
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        part: OpencodePart,
    },
    #[serde(rename = "reasoning")]
    Reasoning {
        #[serde(default)]
        part: OpencodePart,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpencodePart {
    #[serde(default, rename = "sessionID")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub state: OpencodeToolState,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpencodeToolState {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub input: Value,
}
