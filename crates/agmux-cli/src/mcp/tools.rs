use agmux_engine::{aggregate_tasks, default_visible, delta, display_command};
use agmux_runtime::{AgentManager, SpawnRequest, StopOutcome};
use agmux_types::{AgentKind, AgentRecord, AgentStatus, Effort, Mode, format_duration};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::dto::{
    AgentStatusArgs, AgentStatusEntry, AgentStatusResponse, ListTasksArgs, ListTasksResponse,
    SpawnAgentArgs, SpawnAgentResponse, StatusCounts, StopAgentsArgs, StopAgentsResponse,
};

const DEFAULT_TASK_LIMIT: usize = 10;
const MAX_RAW_EVENTS: usize = 50;

/// Operational failures stay in-band; the tool call itself succeeds
fn error_value(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

fn ok_value(response: impl serde::Serialize) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| error_value(format!("serialization error: {}", e)))
}

pub async fn handle_spawn_agent(manager: &AgentManager, args: SpawnAgentArgs) -> Value {
    let kind: AgentKind = match args.agent_type.parse() {
        Ok(kind) => kind,
        Err(e) => return error_value(e.to_string()),
    };
    let mode: Option<Mode> = match args.mode.as_deref().filter(|m| !m.is_empty()) {
        Some(m) => match m.parse() {
            Ok(mode) => Some(mode),
            Err(e) => return error_value(e.to_string()),
        },
        None => None,
    };
    let effort: Option<Effort> = match args.effort.as_deref().filter(|e| !e.is_empty()) {
        Some(e) => match e.parse() {
            Ok(effort) => Some(effort),
            Err(e) => return error_value(e.to_string()),
        },
        None => None,
    };

    let request = SpawnRequest {
        task_name: args.task_name,
        kind,
        prompt: args.prompt,
        cwd: args.cwd,
        mode,
        effort,
        parent_session_id: args.parent_session_id,
        workspace_dir: args.workspace_dir,
    };

    match manager.spawn(request).await {
        Ok(record) => ok_value(SpawnAgentResponse {
            task_name: record.task_name,
            agent_id: record.agent_id,
            agent_type: record.kind.as_str().to_string(),
            status: record.status.to_string(),
            started_at: record.started_at,
        }),
        Err(e) => error_value(e.to_string()),
    }
}

pub async fn handle_agent_status(manager: &AgentManager, args: AgentStatusArgs) -> Value {
    let task_name = args.task_name.unwrap_or_default();
    let parent_session_id = args.parent_session_id.unwrap_or_default();
    if task_name.trim().is_empty() && parent_session_id.trim().is_empty() {
        return error_value("either task_name or parent_session_id is required");
    }

    let filter: Option<AgentStatus> = match args.filter.as_deref() {
        None | Some("") | Some("all") => None,
        Some("running") => Some(AgentStatus::Running),
        Some("completed") => Some(AgentStatus::Completed),
        Some("failed") => Some(AgentStatus::Failed),
        Some("stopped") => Some(AgentStatus::Stopped),
        Some(other) => {
            return error_value(format!(
                "invalid filter '{}' (expected: running, completed, failed, stopped, all)",
                other
            ));
        }
    };

    let since: Option<DateTime<Utc>> = match args.since.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => return error_value(format!("invalid since timestamp '{}'", raw)),
        },
        None => None,
    };
    let include_events = args.include_events.unwrap_or(false);

    let records = if task_name.trim().is_empty() {
        manager.list_by_parent_session(parent_session_id.trim())
    } else {
        manager.list_by_task(task_name.trim())
    };

    // Counts span the whole lookup set; the filter narrows details only
    let mut summary = StatusCounts::default();
    for record in &records {
        match record.status {
            AgentStatus::Running => summary.running += 1,
            AgentStatus::Completed => summary.completed += 1,
            AgentStatus::Failed => summary.failed += 1,
            AgentStatus::Stopped => summary.stopped += 1,
        }
    }

    let now = Utc::now();
    let mut agents = Vec::new();
    let mut top_cursor: Option<DateTime<Utc>> = None;

    for record in &records {
        let events = manager.store().read_all(&record.agent_id).unwrap_or_else(|err| {
            tracing::warn!(agent_id = %record.agent_id, %err, "event log read failed");
            Vec::new()
        });
        let d = delta(&events, since);
        top_cursor = Some(top_cursor.map_or(d.cursor, |c| c.max(d.cursor)));

        if filter.is_some_and(|f| f != record.status) {
            continue;
        }
        agents.push(status_entry(record, &events, d, since, include_events, now));
    }

    ok_value(AgentStatusResponse {
        task_name,
        agents,
        summary,
        cursor: top_cursor.unwrap_or(now),
    })
}

fn status_entry(
    record: &AgentRecord,
    events: &[agmux_types::AgentEvent],
    d: agmux_engine::Delta,
    since: Option<DateTime<Utc>>,
    include_events: bool,
    now: DateTime<Utc>,
) -> AgentStatusEntry {
    let summary = d.summary;

    let events_field = include_events.then(|| {
        let fresh: Vec<agmux_types::AgentEvent> = events
            .iter()
            .filter(|e| since.is_none_or(|s| e.timestamp > s))
            .cloned()
            .collect();
        default_visible(&fresh)
            .into_iter()
            .take(MAX_RAW_EVENTS)
            .filter_map(|e| serde_json::to_value(&e).ok())
            .collect::<Vec<Value>>()
    });

    AgentStatusEntry {
        agent_id: record.agent_id.clone(),
        agent_type: record.kind.as_str().to_string(),
        status: record.status.to_string(),
        duration: format_duration(record.duration(now)),
        files_created: summary.files_created,
        files_modified: summary.files_modified,
        files_read: summary.files_read,
        files_deleted: summary.files_deleted,
        bash_commands: summary
            .bash_commands
            .iter()
            .map(|c| display_command(c))
            .collect(),
        tools_used: summary.tools_used,
        tool_call_count: summary.tool_call_count,
        last_messages: summary.last_messages,
        final_message: summary.final_message,
        has_errors: !summary.errors.is_empty() || record.status == AgentStatus::Failed,
        errors: summary.errors,
        cursor: d.cursor,
        events: events_field,
    }
}

pub async fn handle_stop_agents(manager: &AgentManager, args: StopAgentsArgs) -> Value {
    if args.task_name.trim().is_empty() {
        return error_value("task_name must not be empty");
    }

    let mut response = StopAgentsResponse {
        task_name: args.task_name.clone(),
        stopped: Vec::new(),
        already_stopped: Vec::new(),
        not_found: Vec::new(),
    };

    match args.agent_id {
        Some(agent_id) => match manager.get(&agent_id) {
            Some(record) if record.task_name != args.task_name => {
                return error_value(format!(
                    "agent '{}' belongs to task '{}', not '{}'",
                    agent_id, record.task_name, args.task_name
                ));
            }
            Some(_) => match manager.stop(&agent_id).await {
                Ok(StopOutcome::Stopped) => response.stopped.push(agent_id),
                Ok(StopOutcome::AlreadyStopped) => response.already_stopped.push(agent_id),
                Err(_) => response.not_found.push(agent_id),
            },
            None => response.not_found.push(agent_id),
        },
        None => {
            let report = manager.stop_task(args.task_name.trim()).await;
            response.stopped = report.stopped;
            response.already_stopped = report.already_stopped;
            response.not_found = report.not_found;
        }
    }

    ok_value(response)
}

pub async fn handle_list_tasks(manager: &AgentManager, args: ListTasksArgs) -> Value {
    let limit = args.limit.unwrap_or(DEFAULT_TASK_LIMIT);
    let records = manager.list_all();
    let tasks = aggregate_tasks(&records, Utc::now(), limit);
    ok_value(ListTasksResponse { tasks })
}
