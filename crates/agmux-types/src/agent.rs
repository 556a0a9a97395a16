use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Vendor family of a supervised agent CLI
///
/// Each kind selects a command template and an output normalizer. The set is
/// closed; adding a kind means adding a row to the provider registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Claude,
    Codex,
    Gemini,
    Cursor,
    Opencode,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Claude,
        AgentKind::Codex,
        AgentKind::Gemini,
        AgentKind::Cursor,
        AgentKind::Opencode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Claude => "claude",
            AgentKind::Codex => "codex",
            AgentKind::Gemini => "gemini",
            AgentKind::Cursor => "cursor",
            AgentKind::Opencode => "opencode",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(AgentKind::Claude),
            "codex" => Ok(AgentKind::Codex),
            "gemini" => Ok(AgentKind::Gemini),
            "cursor" => Ok(AgentKind::Cursor),
            "opencode" => Ok(AgentKind::Opencode),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}

/// Permission mode an agent runs under
///
/// `Ralph` is full autonomy driven by a loop file in the working directory;
/// the manager guards it with a working-directory safety check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Plan,
    #[default]
    Edit,
    Ralph,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Plan => "plan",
            Mode::Edit => "edit",
            Mode::Ralph => "ralph",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(Mode::Plan),
            "edit" => Ok(Mode::Edit),
            "ralph" => Ok(Mode::Ralph),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

/// Advisory reasoning/verbosity level, mapped to CLI flags per kind
///
/// Kinds without a matching flag ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Fast,
    #[default]
    Default,
    Detailed,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Fast => "fast",
            Effort::Default => "default",
            Effort::Detailed => "detailed",
        }
    }
}

impl FromStr for Effort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(Effort::Fast),
            "default" => Ok(Effort::Default),
            "detailed" => Ok(Effort::Detailed),
            other => Err(Error::UnknownEffort(other.to_string())),
        }
    }
}

/// Agent lifecycle status
///
/// `Running` is the only non-terminal state; terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Running,
    Completed,
    Failed,
    Stopped,
}

impl AgentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AgentStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Running => "running",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
            AgentStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted per-agent record (`meta.json`)
///
/// `pid` is present only while the agent is running; terminal transitions
/// clear it. The record is rewritten atomically (write-temp + rename).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub task_name: String,
    pub kind: AgentKind,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub effort: Effort,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<String>,
    pub status: AgentStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Vendor-assigned session id, captured from the first `init` event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub event_log_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl AgentRecord {
    /// Apply a terminal transition. No-op when already terminal.
    ///
    /// Returns true when the transition was applied.
    pub fn mark_terminal(&mut self, status: AgentStatus, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.completed_at = Some(now);
        self.pid = None;
        true
    }

    /// Wall-clock duration: `completed_at - started_at` for terminal agents,
    /// `now - started_at` while running.
    pub fn duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.completed_at.unwrap_or(now) - self.started_at
    }
}
