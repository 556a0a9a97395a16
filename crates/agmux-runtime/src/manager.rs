use agmux_providers::{build_command, normalizer_for, program_for, ralph_preamble};
use agmux_store::EventStore;
use agmux_types::{
    AgentEvent, AgentKind, AgentRecord, AgentStatus, Effort, EventPayload, Mode,
};
use chrono::Utc;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::process;
use crate::safety::validate_ralph_cwd;
use crate::tailer::run_tailer;

/// When set, used as `parent_session_id` for spawns that omit it
pub const SESSION_ID_ENV: &str = "AGMUX_SESSION_ID";

pub const DEFAULT_POOL_SIZE: usize = 50;
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Cap on concurrently running agents; spawns above it are rejected
    pub max_running: usize,
    /// Mode applied when a spawn does not name one
    pub default_mode: Mode,
    /// How long a stopped child gets between SIGTERM and SIGKILL
    pub grace: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_running: DEFAULT_POOL_SIZE,
            default_mode: Mode::Edit,
            grace: DEFAULT_GRACE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub task_name: String,
    pub kind: AgentKind,
    pub prompt: String,
    pub cwd: Option<String>,
    pub mode: Option<Mode>,
    pub effort: Option<Effort>,
    pub parent_session_id: Option<String>,
    pub workspace_dir: Option<String>,
}

pub(crate) struct AgentState {
    pub record: AgentRecord,
    pub stop_requested: bool,
    /// Survived a supervisor restart with its process alive; not tailed and
    /// not counted against the pool
    pub orphaned: bool,
}

pub(crate) struct AgentSlot {
    pub state: Mutex<AgentState>,
    pub exit: Notify,
}

pub(crate) type SharedAgent = Arc<AgentSlot>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

#[derive(Debug, Clone, Default)]
pub struct StopReport {
    pub stopped: Vec<String>,
    pub already_stopped: Vec<String>,
    pub not_found: Vec<String>,
}

/// Owner of the in-memory agent index
///
/// The index is guarded by a readers-writer lock with short critical
/// sections; per-agent fields sit behind their own mutex so no lock is ever
/// held across I/O. The tailer is the only writer of a running agent's
/// record.
pub struct AgentManager {
    store: Arc<EventStore>,
    config: ManagerConfig,
    agents: RwLock<HashMap<String, SharedAgent>>,
}

impl AgentManager {
    pub fn new(store: EventStore, config: ManagerConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            agents: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Repopulate the index from the store at startup
    ///
    /// Persisted `running` agents whose process is gone (or runs a different
    /// program) are reclassified as failed with an error event appended.
    /// Survivors stay `running` but are flagged orphaned: their logs are
    /// final and they do not count against the pool.
    pub fn recover(&self) -> Result<usize> {
        let records = self.store.load_all()?;
        let count = records.len();

        for mut record in records {
            let mut orphaned = false;

            if record.status == AgentStatus::Running {
                let program = program_for(record.kind);
                let alive = record
                    .pid
                    .is_some_and(|pid| process::pid_alive(pid) && process::comm_matches(pid, &program));

                if alive {
                    orphaned = true;
                    tracing::info!(
                        agent_id = %record.agent_id,
                        pid = record.pid,
                        "recovered live agent; log will not be resumed"
                    );
                } else {
                    let now = Utc::now();
                    let _ = self.store.append_event(
                        &record.agent_id,
                        &AgentEvent::now(
                            record.kind,
                            EventPayload::Error {
                                message: format!(
                                    "supervisor restarted and agent process (pid {}) is gone",
                                    record.pid.map_or("unknown".to_string(), |p| p.to_string()),
                                ),
                            },
                        ),
                    );
                    if !self.log_has_result(&record.agent_id) {
                        let duration_ms = (now - record.started_at).num_milliseconds().max(0) as u64;
                        let _ = self.store.append_event(
                            &record.agent_id,
                            &AgentEvent::now(
                                record.kind,
                                EventPayload::Result {
                                    status: "error".to_string(),
                                    duration_ms: Some(duration_ms),
                                    usage: None,
                                },
                            ),
                        );
                    }
                    record.mark_terminal(AgentStatus::Failed, now);
                    if let Err(err) = self.store.write_meta(&record) {
                        tracing::warn!(agent_id = %record.agent_id, %err, "recovery meta write failed");
                    }
                }
            }

            let slot = Arc::new(AgentSlot {
                state: Mutex::new(AgentState {
                    record: record.clone(),
                    stop_requested: false,
                    orphaned,
                }),
                exit: Notify::new(),
            });
            self.agents
                .write()
                .unwrap()
                .insert(record.agent_id.clone(), slot);
        }

        Ok(count)
    }

    /// Spawn a new agent: guard, reserve a pool slot, persist, fork, tail
    pub async fn spawn(&self, req: SpawnRequest) -> Result<AgentRecord> {
        if req.task_name.trim().is_empty() {
            return Err(Error::Validation("task_name must not be empty".to_string()));
        }
        if req.prompt.trim().is_empty() {
            return Err(Error::Validation("prompt must not be empty".to_string()));
        }

        let mode = req.mode.unwrap_or(self.config.default_mode);
        let effort = req.effort.unwrap_or_default();

        let exec_prompt = if mode == Mode::Ralph {
            validate_ralph_cwd(req.cwd.as_deref())?;
            ralph_preamble(&req.prompt)
        } else {
            req.prompt.clone()
        };

        let parent_session_id = req
            .parent_session_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                std::env::var(SESSION_ID_ENV)
                    .ok()
                    .filter(|s| !s.trim().is_empty())
            });

        let agent_id = self.allocate_agent_id();
        let now = Utc::now();
        let record = AgentRecord {
            agent_id: agent_id.clone(),
            task_name: req.task_name.trim().to_string(),
            kind: req.kind,
            prompt: req.prompt.clone(),
            cwd: req.cwd.clone(),
            mode,
            effort,
            parent_session_id,
            workspace_dir: req.workspace_dir.clone(),
            status: AgentStatus::Running,
            started_at: now,
            completed_at: None,
            session_id: None,
            event_log_path: self.store.event_log_path(&agent_id).display().to_string(),
            pid: None,
        };

        let slot: SharedAgent = Arc::new(AgentSlot {
            state: Mutex::new(AgentState {
                record: record.clone(),
                stop_requested: false,
                orphaned: false,
            }),
            exit: Notify::new(),
        });

        // Pool check and slot reservation are one critical section so two
        // racing spawns cannot both squeeze past the cap.
        {
            let mut agents = self.agents.write().unwrap();
            let running = agents.values().filter(|s| is_pooled(s)).count();
            if running >= self.config.max_running {
                return Err(Error::PoolExhausted(self.config.max_running));
            }
            agents.insert(agent_id.clone(), slot.clone());
        }

        // Record hits the store before the child's stdout exists
        if let Err(err) = self.store.create(&record) {
            self.agents.write().unwrap().remove(&agent_id);
            return Err(err.into());
        }

        let spec = build_command(req.kind, &exec_prompt, mode, effort);
        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(cwd) = &req.cwd {
            command.current_dir(cwd);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                let now = Utc::now();
                let _ = self.store.append_event(
                    &agent_id,
                    &AgentEvent::now(
                        req.kind,
                        EventPayload::Error {
                            message: format!("failed to start '{}': {}", spec.program, err),
                        },
                    ),
                );
                let _ = self.store.append_event(
                    &agent_id,
                    &AgentEvent::now(
                        req.kind,
                        EventPayload::Result {
                            status: "error".to_string(),
                            duration_ms: Some(0),
                            usage: None,
                        },
                    ),
                );
                let record = {
                    let mut state = slot.state.lock().unwrap();
                    state.record.mark_terminal(AgentStatus::Failed, now);
                    state.record.clone()
                };
                let _ = self.store.write_meta(&record);
                return Err(Error::Spawn(err));
            }
        };

        let record = {
            let mut state = slot.state.lock().unwrap();
            state.record.pid = child.id();
            state.record.clone()
        };
        if let Err(err) = self.store.write_meta(&record) {
            tracing::warn!(%agent_id, %err, "pid meta write failed");
        }

        tokio::spawn(run_tailer(
            self.store.clone(),
            slot,
            child,
            normalizer_for(req.kind),
        ));

        tracing::info!(
            %agent_id,
            kind = %req.kind,
            task = %record.task_name,
            mode = %mode,
            "spawned agent"
        );
        Ok(record)
    }

    /// Stop one agent: SIGTERM, grace wait, SIGKILL
    pub async fn stop(&self, agent_id: &str) -> Result<StopOutcome> {
        let slot = self
            .agents
            .read()
            .unwrap()
            .get(agent_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(agent_id.to_string()))?;
        Ok(Self::stop_slot(self.store.clone(), slot, self.config.grace).await)
    }

    /// Stop every running agent in a task, concurrently
    pub async fn stop_task(&self, task_name: &str) -> StopReport {
        let targets: Vec<(String, SharedAgent)> = {
            let agents = self.agents.read().unwrap();
            agents
                .iter()
                .filter(|(_, slot)| slot.state.lock().unwrap().record.task_name == task_name)
                .map(|(id, slot)| (id.clone(), slot.clone()))
                .collect()
        };

        let mut report = StopReport::default();
        let mut set = tokio::task::JoinSet::new();
        for (agent_id, slot) in targets {
            let store = self.store.clone();
            let grace = self.config.grace;
            set.spawn(async move { (agent_id, Self::stop_slot(store, slot, grace).await) });
        }
        while let Some(joined) = set.join_next().await {
            if let Ok((agent_id, outcome)) = joined {
                match outcome {
                    StopOutcome::Stopped => report.stopped.push(agent_id),
                    StopOutcome::AlreadyStopped => report.already_stopped.push(agent_id),
                }
            }
        }
        report.stopped.sort();
        report.already_stopped.sort();
        report
    }

    async fn stop_slot(store: Arc<EventStore>, slot: SharedAgent, grace: Duration) -> StopOutcome {
        let (pid, orphaned) = {
            let mut state = slot.state.lock().unwrap();
            if state.record.status.is_terminal() {
                return StopOutcome::AlreadyStopped;
            }
            state.stop_requested = true;
            (state.record.pid, state.orphaned)
        };

        if let Some(pid) = pid {
            process::send_sigterm(pid);
        }

        if orphaned {
            // No tailer to observe the exit; poll the pid directly.
            if let Some(pid) = pid {
                if !wait_pid_exit(pid, grace).await {
                    process::send_sigkill(pid);
                    wait_pid_exit(pid, Duration::from_millis(500)).await;
                }
            }
        } else if !wait_slot_exit(&slot, grace).await {
            if let Some(pid) = pid {
                process::send_sigkill(pid);
            }
            wait_slot_exit(&slot, grace).await;
        }

        // The tailer normally lands the terminal transition; force it for
        // orphans and wedged pipes so stop always terminates the record.
        finalize_stop(&store, &slot);
        StopOutcome::Stopped
    }

    pub fn get(&self, agent_id: &str) -> Option<AgentRecord> {
        let agents = self.agents.read().unwrap();
        agents
            .get(agent_id)
            .map(|slot| slot.state.lock().unwrap().record.clone())
    }

    pub fn list_all(&self) -> Vec<AgentRecord> {
        self.collect(|_| true)
    }

    pub fn list_by_task(&self, task_name: &str) -> Vec<AgentRecord> {
        self.collect(|record| record.task_name == task_name)
    }

    pub fn list_by_parent_session(&self, parent_session_id: &str) -> Vec<AgentRecord> {
        self.collect(|record| record.parent_session_id.as_deref() == Some(parent_session_id))
    }

    pub fn running_count(&self) -> usize {
        let agents = self.agents.read().unwrap();
        agents.values().filter(|slot| is_pooled(slot)).count()
    }

    /// Graceful supervisor shutdown: SIGTERM everyone, one shared grace
    /// window, SIGKILL stragglers, persist final state
    pub async fn shutdown(&self) {
        let running: Vec<SharedAgent> = {
            let agents = self.agents.read().unwrap();
            agents
                .values()
                .filter(|slot| {
                    let state = slot.state.lock().unwrap();
                    state.record.status == AgentStatus::Running && !state.orphaned
                })
                .cloned()
                .collect()
        };
        if running.is_empty() {
            return;
        }
        tracing::info!(count = running.len(), "terminating running agents");

        for slot in &running {
            let pid = {
                let mut state = slot.state.lock().unwrap();
                state.stop_requested = true;
                state.record.pid
            };
            if let Some(pid) = pid {
                process::send_sigterm(pid);
            }
        }

        let deadline = tokio::time::Instant::now() + self.config.grace;
        for slot in &running {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                break;
            }
            wait_slot_exit(slot, deadline - now).await;
        }

        for slot in &running {
            let (terminal, pid) = {
                let state = slot.state.lock().unwrap();
                (state.record.status.is_terminal(), state.record.pid)
            };
            if !terminal {
                if let Some(pid) = pid {
                    process::send_sigkill(pid);
                }
            }
        }
        for slot in &running {
            wait_slot_exit(slot, Duration::from_millis(500)).await;
        }
        for slot in &running {
            finalize_stop(&self.store, slot);
        }
    }

    fn collect(&self, keep: impl Fn(&AgentRecord) -> bool) -> Vec<AgentRecord> {
        let agents = self.agents.read().unwrap();
        let mut records: Vec<AgentRecord> = agents
            .values()
            .map(|slot| slot.state.lock().unwrap().record.clone())
            .filter(|record| keep(record))
            .collect();
        records.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        records
    }

    fn allocate_agent_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string();
            let taken = self.agents.read().unwrap().contains_key(&id)
                || self.store.agent_dir(&id).exists();
            if !taken {
                return id;
            }
        }
    }

    fn log_has_result(&self, agent_id: &str) -> bool {
        self.store
            .read_all(agent_id)
            .map(|events| {
                events
                    .iter()
                    .any(|e| matches!(e.payload, EventPayload::Result { .. }))
            })
            .unwrap_or(false)
    }
}

fn is_pooled(slot: &SharedAgent) -> bool {
    let state = slot.state.lock().unwrap();
    state.record.status == AgentStatus::Running && !state.orphaned
}

/// Terminal `stopped` transition applied outside the tailer; no-op when the
/// tailer got there first
fn finalize_stop(store: &EventStore, slot: &SharedAgent) {
    let now = Utc::now();
    let record = {
        let mut state = slot.state.lock().unwrap();
        if !state.record.mark_terminal(AgentStatus::Stopped, now) {
            return;
        }
        state.record.clone()
    };
    let duration_ms = (now - record.started_at).num_milliseconds().max(0) as u64;
    let _ = store.append_event(
        &record.agent_id,
        &AgentEvent::now(
            record.kind,
            EventPayload::Result {
                status: "stopped".to_string(),
                duration_ms: Some(duration_ms),
                usage: None,
            },
        ),
    );
    if let Err(err) = store.write_meta(&record) {
        tracing::warn!(agent_id = %record.agent_id, %err, "stop meta write failed");
    }
}

/// Deadline-aware wait on the tailer's exit notification
///
/// The notification is armed before the status check, so an exit landing
/// between the two cannot be missed.
async fn wait_slot_exit(slot: &SharedAgent, timeout: Duration) -> bool {
    let notified = slot.exit.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();

    if slot.state.lock().unwrap().record.status.is_terminal() {
        return true;
    }
    tokio::time::timeout(timeout, notified).await.is_ok()
}

/// Poll a pid until it dies or the deadline passes (orphans have no tailer)
async fn wait_pid_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if !process::pid_alive(pid) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
