// MCP tool request/response types
//
// Input schemas are generated from these structs via schemars, so the structs
// are the single source of truth for the wire contract. Operational failures
// are returned in-band as {"error": "..."} with a normal tools/call result;
// only malformed arguments surface as protocol-level errors.

use agmux_engine::TaskRollup;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spawn a new coding agent under a task label
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SpawnAgentArgs {
    /// Task label grouping related agents; labels are not unique
    pub task_name: String,
    /// Agent family: claude, codex, gemini, cursor, or opencode
    pub agent_type: String,
    /// Prompt handed to the agent CLI
    pub prompt: String,
    /// Working directory for the agent process
    #[serde(default)]
    pub cwd: Option<String>,
    /// plan (read-only), edit (default), or ralph (autonomous loop;
    /// requires a LOOP.md in cwd)
    #[serde(default)]
    pub mode: Option<String>,
    /// Advisory reasoning depth: fast, default, or detailed
    #[serde(default)]
    pub effort: Option<String>,
    /// Session id of the spawning agent, for hierarchy bookkeeping
    #[serde(default)]
    pub parent_session_id: Option<String>,
    /// Informational workspace path recorded with the agent
    #[serde(default)]
    pub workspace_dir: Option<String>,
}

/// Poll agent activity for a task or a parent session
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AgentStatusArgs {
    /// Task to inspect; either this or parent_session_id is required
    #[serde(default)]
    pub task_name: Option<String>,
    /// List agents spawned by this session instead of by task name
    #[serde(default)]
    pub parent_session_id: Option<String>,
    /// Restrict per-agent details to one status: running, completed,
    /// failed, stopped, or all (default)
    #[serde(default)]
    pub filter: Option<String>,
    /// Cursor from a previous call (ISO 8601); only newer activity is
    /// returned
    #[serde(default)]
    pub since: Option<String>,
    /// Attach the new raw canonical events (verbose chatter excluded)
    #[serde(default)]
    pub include_events: Option<bool>,
}

/// Stop a task's running agents, or one agent by id
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StopAgentsArgs {
    /// Task whose agents should stop
    pub task_name: String,
    /// Stop only this agent; must belong to task_name
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// List known tasks by recent activity
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListTasksArgs {
    /// Maximum number of tasks to return (default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

// --- Responses ---

#[derive(Debug, Serialize)]
pub struct SpawnAgentResponse {
    pub task_name: String,
    pub agent_id: String,
    pub agent_type: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize)]
pub struct StatusCounts {
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub stopped: usize,
}

#[derive(Debug, Serialize)]
pub struct AgentStatusEntry {
    pub agent_id: String,
    pub agent_type: String,
    pub status: String,
    pub duration: String,
    pub files_created: Vec<String>,
    pub files_modified: Vec<String>,
    pub files_read: Vec<String>,
    pub files_deleted: Vec<String>,
    /// Truncated for display; full text lives in the event log
    pub bash_commands: Vec<String>,
    pub tools_used: Vec<String>,
    pub tool_call_count: usize,
    pub last_messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_message: Option<String>,
    pub errors: Vec<String>,
    pub has_errors: bool,
    pub cursor: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
pub struct AgentStatusResponse {
    pub task_name: String,
    pub agents: Vec<AgentStatusEntry>,
    pub summary: StatusCounts,
    pub cursor: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StopAgentsResponse {
    pub task_name: String,
    pub stopped: Vec<String>,
    pub already_stopped: Vec<String>,
    pub not_found: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskRollup>,
}
