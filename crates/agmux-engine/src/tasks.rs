use agmux_types::{AgentRecord, AgentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-task rollup derived from the agent records sharing a task name
///
/// Tasks are labels, not entities: nothing is persisted per task and the
/// rollup is recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRollup {
    pub task_name: String,
    pub agent_count: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub stopped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<String>,
    /// Earliest `started_at` across the task's agents
    pub created_at: DateTime<Utc>,
    /// Latest activity: max of terminal `completed_at`, with `now` standing
    /// in for still-running agents
    pub modified_at: DateTime<Utc>,
}

/// Group records by task, newest activity first, truncated to `limit`
pub fn aggregate_tasks(
    records: &[AgentRecord],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<TaskRollup> {
    let mut rollups: Vec<TaskRollup> = Vec::new();

    for record in records {
        let modified = match record.status {
            AgentStatus::Running => now,
            _ => record.completed_at.unwrap_or(record.started_at),
        };

        let rollup = match rollups.iter_mut().find(|r| r.task_name == record.task_name) {
            Some(rollup) => rollup,
            None => {
                rollups.push(TaskRollup {
                    task_name: record.task_name.clone(),
                    agent_count: 0,
                    running: 0,
                    completed: 0,
                    failed: 0,
                    stopped: 0,
                    workspace_dir: None,
                    created_at: record.started_at,
                    modified_at: modified,
                });
                rollups.last_mut().unwrap()
            }
        };

        rollup.agent_count += 1;
        match record.status {
            AgentStatus::Running => rollup.running += 1,
            AgentStatus::Completed => rollup.completed += 1,
            AgentStatus::Failed => rollup.failed += 1,
            AgentStatus::Stopped => rollup.stopped += 1,
        }
        if rollup.workspace_dir.is_none() {
            rollup.workspace_dir = record.workspace_dir.clone();
        }
        rollup.created_at = rollup.created_at.min(record.started_at);
        rollup.modified_at = rollup.modified_at.max(modified);
    }

    rollups.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    rollups.truncate(limit);
    rollups
}

#[cfg(test)]
mod tests {
    use super::*;
    use agmux_types::{AgentKind, Effort, Mode};
    use chrono::Duration;

    fn record(task: &str, status: AgentStatus, started_offset: i64, base: DateTime<Utc>) -> AgentRecord {
        let started_at = base + Duration::seconds(started_offset);
        AgentRecord {
            agent_id: format!("{}-{}", task, started_offset),
            task_name: task.to_string(),
            kind: AgentKind::Codex,
            prompt: "p".to_string(),
            cwd: None,
            mode: Mode::Edit,
            effort: Effort::Default,
            parent_session_id: None,
            workspace_dir: None,
            status,
            started_at,
            completed_at: status.is_terminal().then(|| started_at + Duration::seconds(5)),
            session_id: None,
            event_log_path: String::new(),
            pid: None,
        }
    }

    #[test]
    fn counts_partition_by_status_and_sum_to_agent_count() {
        let base = Utc::now();
        let records = vec![
            record("t", AgentStatus::Running, 0, base),
            record("t", AgentStatus::Completed, 1, base),
            record("t", AgentStatus::Failed, 2, base),
            record("t", AgentStatus::Stopped, 3, base),
        ];
        let rollups = aggregate_tasks(&records, base + Duration::seconds(60), 10);
        assert_eq!(rollups.len(), 1);
        let r = &rollups[0];
        assert_eq!(r.agent_count, 4);
        assert_eq!(r.running + r.completed + r.failed + r.stopped, r.agent_count);
        assert_eq!(r.created_at, base);
    }

    #[test]
    fn tasks_sort_by_recency_and_respect_limit() {
        let base = Utc::now();
        let now = base + Duration::seconds(600);
        let records = vec![
            record("old", AgentStatus::Completed, 0, base),
            record("busy", AgentStatus::Running, 10, base),
            record("mid", AgentStatus::Completed, 100, base),
        ];

        let rollups = aggregate_tasks(&records, now, 10);
        let names: Vec<_> = rollups.iter().map(|r| r.task_name.as_str()).collect();
        // The running task is pinned to `now`, so it sorts first
        assert_eq!(names, vec!["busy", "mid", "old"]);

        let limited = aggregate_tasks(&records, now, 2);
        assert_eq!(limited.len(), 2);
    }
}
