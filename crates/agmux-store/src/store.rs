use agmux_types::{AgentEvent, AgentRecord};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::root::resolve_store_root;

const META_FILE: &str = "meta.json";
const EVENTS_FILE: &str = "events.jsonl";

/// Durable per-agent state under a single root directory
///
/// Layout: `<root>/<agent_id>/{meta.json, events.jsonl}`. The metadata record
/// is replaced atomically; the event log only ever grows. These are the only
/// files agmux writes.
#[derive(Debug, Clone)]
pub struct EventStore {
    root: PathBuf,
}

impl EventStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open at the resolved default root (see [`crate::resolve_store_root`])
    pub fn open_default() -> Self {
        Self::new(resolve_store_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn agent_dir(&self, agent_id: &str) -> PathBuf {
        self.root.join(agent_id)
    }

    pub fn event_log_path(&self, agent_id: &str) -> PathBuf {
        self.agent_dir(agent_id).join(EVENTS_FILE)
    }

    /// Create the agent's directory, metadata record, and empty event log
    ///
    /// Fails with [`Error::AlreadyExists`] when the id collides.
    pub fn create(&self, record: &AgentRecord) -> Result<PathBuf> {
        let dir = self.agent_dir(&record.agent_id);
        if dir.exists() {
            return Err(Error::AlreadyExists(record.agent_id.clone()));
        }
        std::fs::create_dir_all(&dir)?;
        self.write_meta(record)?;

        let log_path = self.event_log_path(&record.agent_id);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        Ok(log_path)
    }

    /// Atomically replace the metadata record (write-temp + rename)
    pub fn write_meta(&self, record: &AgentRecord) -> Result<()> {
        let dir = self.agent_dir(&record.agent_id);
        std::fs::create_dir_all(&dir)?;

        let tmp = dir.join(".meta.json.tmp");
        let json = serde_json::to_vec_pretty(record)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, dir.join(META_FILE))?;
        Ok(())
    }

    pub fn read_meta(&self, agent_id: &str) -> Result<AgentRecord> {
        let path = self.agent_dir(agent_id).join(META_FILE);
        let bytes = std::fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(agent_id.to_string())
            } else {
                Error::Io(err)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Append one event as a single line, relying on O_APPEND semantics
    ///
    /// The tailer is the sole producer per agent, so lines never interleave.
    pub fn append_event(&self, agent_id: &str, event: &AgentEvent) -> Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.event_log_path(agent_id))?;
        file.write_all(&line)?;
        Ok(())
    }

    /// Read the whole event log, skipping malformed lines
    ///
    /// A torn final line (supervisor killed mid-append) parses as garbage and
    /// is dropped rather than failing the read.
    pub fn read_all(&self, agent_id: &str) -> Result<Vec<AgentEvent>> {
        let path = self.event_log_path(agent_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::Io(err)),
        };

        let mut events = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<AgentEvent>(line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::debug!(%agent_id, %err, "skipping malformed event line");
                }
            }
        }
        Ok(events)
    }

    /// Events strictly newer than `since`
    pub fn read_since(&self, agent_id: &str, since: DateTime<Utc>) -> Result<Vec<AgentEvent>> {
        let mut events = self.read_all(agent_id)?;
        events.retain(|e| e.timestamp > since);
        Ok(events)
    }

    /// Load every metadata record under the root; used at startup
    ///
    /// Unreadable entries are logged and skipped so one corrupt record cannot
    /// block recovery of the rest.
    pub fn load_all(&self) -> Result<Vec<AgentRecord>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::Io(err)),
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let Some(agent_id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            match self.read_meta(&agent_id) {
                Ok(record) => records.push(record),
                Err(Error::NotFound(_)) => {}
                Err(err) => {
                    tracing::warn!(%agent_id, %err, "skipping unreadable agent record");
                }
            }
        }
        Ok(records)
    }
}
