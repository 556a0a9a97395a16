use agmux::mcp::{
    AgentStatusArgs, ListTasksArgs, SpawnAgentArgs, StopAgentsArgs, handle_agent_status,
    handle_list_tasks, handle_spawn_agent, handle_stop_agents,
};
use agmux_runtime::{AgentManager, ManagerConfig};
use agmux_store::EventStore;
use agmux_types::{
    AgentEvent, AgentKind, AgentRecord, AgentStatus, Effort, EventPayload, Mode,
};
use chrono::{DateTime, Duration, Utc};

fn seeded_record(
    store: &EventStore,
    agent_id: &str,
    task: &str,
    status: AgentStatus,
    started_at: DateTime<Utc>,
) -> AgentRecord {
    let mut record = AgentRecord {
        agent_id: agent_id.to_string(),
        task_name: task.to_string(),
        kind: AgentKind::Codex,
        prompt: "p".to_string(),
        cwd: None,
        mode: Mode::Edit,
        effort: Effort::Default,
        parent_session_id: Some("parent-1".to_string()),
        workspace_dir: Some("/work/repo".to_string()),
        status: AgentStatus::Running,
        started_at,
        completed_at: None,
        session_id: None,
        event_log_path: store.event_log_path(agent_id).display().to_string(),
        pid: None,
    };
    record.mark_terminal(status, started_at + Duration::seconds(30));
    store.create(&record).unwrap();
    record
}

fn manager_over(store: &EventStore) -> AgentManager {
    let manager = AgentManager::new(store.clone(), ManagerConfig::default());
    manager.recover().unwrap();
    manager
}

#[tokio::test]
async fn status_requires_a_lookup_key() {
    let tmp = tempfile::tempdir().unwrap();
    let manager = manager_over(&EventStore::new(tmp.path()));

    let value = handle_agent_status(
        &manager,
        AgentStatusArgs {
            task_name: None,
            parent_session_id: None,
            filter: None,
            since: None,
            include_events: None,
        },
    )
    .await;
    assert!(value["error"].as_str().unwrap().contains("task_name"));
}

#[tokio::test]
async fn status_counts_span_lookup_set_while_filter_narrows_details() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EventStore::new(tmp.path());
    let base = Utc::now() - Duration::seconds(300);

    seeded_record(&store, "a1", "feat", AgentStatus::Completed, base);
    seeded_record(&store, "a2", "feat", AgentStatus::Failed, base);
    seeded_record(&store, "a3", "other", AgentStatus::Completed, base);
    let manager = manager_over(&store);

    let value = handle_agent_status(
        &manager,
        AgentStatusArgs {
            task_name: Some("feat".to_string()),
            parent_session_id: None,
            filter: Some("failed".to_string()),
            since: None,
            include_events: None,
        },
    )
    .await;

    assert_eq!(value["summary"]["completed"], 1);
    assert_eq!(value["summary"]["failed"], 1);
    assert_eq!(value["summary"]["running"], 0);

    let agents = value["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0]["agent_id"], "a2");
    assert_eq!(agents[0]["has_errors"], true);
}

#[tokio::test]
async fn status_lookup_by_parent_session() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EventStore::new(tmp.path());
    let base = Utc::now() - Duration::seconds(300);
    seeded_record(&store, "a1", "feat", AgentStatus::Completed, base);
    let manager = manager_over(&store);

    let value = handle_agent_status(
        &manager,
        AgentStatusArgs {
            task_name: None,
            parent_session_id: Some("parent-1".to_string()),
            filter: None,
            since: None,
            include_events: None,
        },
    )
    .await;
    assert_eq!(value["agents"].as_array().unwrap().len(), 1);

    let value = handle_agent_status(
        &manager,
        AgentStatusArgs {
            task_name: None,
            parent_session_id: Some("nobody".to_string()),
            filter: None,
            since: None,
            include_events: None,
        },
    )
    .await;
    assert!(value["agents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn polling_with_returned_cursor_yields_empty_delta() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EventStore::new(tmp.path());
    let base = Utc::now() - Duration::seconds(300);

    let record = seeded_record(&store, "a1", "feat", AgentStatus::Completed, base);
    for (offset, path) in [(1i64, "src/a.rs"), (2, "src/b.rs")] {
        store
            .append_event(
                &record.agent_id,
                &AgentEvent::new(
                    AgentKind::Codex,
                    base + Duration::seconds(offset),
                    EventPayload::FileWrite {
                        tool: "apply_patch".to_string(),
                        path: path.to_string(),
                        command: None,
                    },
                ),
            )
            .unwrap();
    }
    let manager = manager_over(&store);

    let first = handle_agent_status(
        &manager,
        AgentStatusArgs {
            task_name: Some("feat".to_string()),
            parent_session_id: None,
            filter: None,
            since: None,
            include_events: None,
        },
    )
    .await;
    let files = first["agents"][0]["files_modified"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    let cursor = first["cursor"].as_str().unwrap().to_string();

    let second = handle_agent_status(
        &manager,
        AgentStatusArgs {
            task_name: Some("feat".to_string()),
            parent_session_id: None,
            filter: None,
            since: Some(cursor),
            include_events: None,
        },
    )
    .await;
    assert!(
        second["agents"][0]["files_modified"]
            .as_array()
            .unwrap()
            .is_empty()
    );
    assert_eq!(second["summary"]["completed"], 1);
}

#[tokio::test]
async fn include_events_attaches_filtered_raw_events() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EventStore::new(tmp.path());
    let base = Utc::now() - Duration::seconds(300);

    let record = seeded_record(&store, "a1", "feat", AgentStatus::Completed, base);
    store
        .append_event(
            &record.agent_id,
            &AgentEvent::new(
                AgentKind::Codex,
                base + Duration::seconds(1),
                EventPayload::Thinking {
                    content: "pondering".to_string(),
                    complete: false,
                },
            ),
        )
        .unwrap();
    store
        .append_event(
            &record.agent_id,
            &AgentEvent::new(
                AgentKind::Codex,
                base + Duration::seconds(2),
                EventPayload::Bash {
                    tool: "shell".to_string(),
                    command: "cargo check".to_string(),
                },
            ),
        )
        .unwrap();
    let manager = manager_over(&store);

    let value = handle_agent_status(
        &manager,
        AgentStatusArgs {
            task_name: Some("feat".to_string()),
            parent_session_id: None,
            filter: None,
            since: None,
            include_events: Some(true),
        },
    )
    .await;

    let events = value["agents"][0]["events"].as_array().unwrap();
    // The incomplete thinking fragment is verbose chatter and stays hidden
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "bash");
}

#[tokio::test]
async fn stop_rejects_agent_from_another_task() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EventStore::new(tmp.path());
    let base = Utc::now() - Duration::seconds(300);
    seeded_record(&store, "a1", "feat", AgentStatus::Completed, base);
    let manager = manager_over(&store);

    let value = handle_stop_agents(
        &manager,
        StopAgentsArgs {
            task_name: "other-task".to_string(),
            agent_id: Some("a1".to_string()),
        },
    )
    .await;
    assert!(value["error"].as_str().unwrap().contains("belongs to task"));

    // Unknown id lands in not_found rather than erroring
    let value = handle_stop_agents(
        &manager,
        StopAgentsArgs {
            task_name: "feat".to_string(),
            agent_id: Some("ghost".to_string()),
        },
    )
    .await;
    assert_eq!(value["not_found"][0], "ghost");
}

#[tokio::test]
async fn stop_task_of_terminal_agents_reports_already_stopped() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EventStore::new(tmp.path());
    let base = Utc::now() - Duration::seconds(300);
    seeded_record(&store, "a1", "feat", AgentStatus::Completed, base);
    seeded_record(&store, "a2", "feat", AgentStatus::Stopped, base);
    let manager = manager_over(&store);

    let value = handle_stop_agents(
        &manager,
        StopAgentsArgs {
            task_name: "feat".to_string(),
            agent_id: None,
        },
    )
    .await;
    assert!(value["stopped"].as_array().unwrap().is_empty());
    assert_eq!(value["already_stopped"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_tasks_rolls_up_and_limits() {
    let tmp = tempfile::tempdir().unwrap();
    let store = EventStore::new(tmp.path());
    let base = Utc::now() - Duration::seconds(3000);

    seeded_record(&store, "a1", "alpha", AgentStatus::Completed, base);
    seeded_record(
        &store,
        "a2",
        "alpha",
        AgentStatus::Failed,
        base + Duration::seconds(100),
    );
    seeded_record(
        &store,
        "b1",
        "beta",
        AgentStatus::Completed,
        base + Duration::seconds(500),
    );
    let manager = manager_over(&store);

    let value = handle_list_tasks(&manager, ListTasksArgs { limit: None }).await;
    let tasks = value["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    // beta finished later, so it sorts first
    assert_eq!(tasks[0]["task_name"], "beta");
    assert_eq!(tasks[1]["task_name"], "alpha");
    assert_eq!(tasks[1]["agent_count"], 2);
    assert_eq!(tasks[1]["failed"], 1);
    assert_eq!(tasks[1]["workspace_dir"], "/work/repo");

    let value = handle_list_tasks(&manager, ListTasksArgs { limit: Some(1) }).await;
    assert_eq!(value["tasks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn spawn_validates_kind_and_mode_in_band() {
    let tmp = tempfile::tempdir().unwrap();
    let manager = manager_over(&EventStore::new(tmp.path()));

    let value = handle_spawn_agent(
        &manager,
        SpawnAgentArgs {
            task_name: "t".to_string(),
            agent_type: "galactic".to_string(),
            prompt: "p".to_string(),
            cwd: None,
            mode: None,
            effort: None,
            parent_session_id: None,
            workspace_dir: None,
        },
    )
    .await;
    assert!(value["error"].as_str().unwrap().contains("unknown agent type"));

    let value = handle_spawn_agent(
        &manager,
        SpawnAgentArgs {
            task_name: "t".to_string(),
            agent_type: "codex".to_string(),
            prompt: "p".to_string(),
            cwd: None,
            mode: Some("yolo".to_string()),
            effort: None,
            parent_session_id: None,
            workspace_dir: None,
        },
    )
    .await;
    assert!(value["error"].as_str().unwrap().contains("invalid mode"));
}
