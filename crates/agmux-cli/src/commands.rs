use agmux_runtime::{AgentManager, ManagerConfig};
use agmux_store::EventStore;
use agmux_types::AgentStatus;
use anyhow::Result;
use std::sync::Arc;

use crate::args::{Cli, Commands};
use crate::mcp::run_server;
use crate::output;

pub fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Serve => runtime.block_on(serve()),
        Commands::Agents { task, all } => agents(task, all),
        Commands::Tasks { limit } => tasks(limit),
    }
}

async fn serve() -> Result<()> {
    let store = EventStore::open_default();
    tracing::info!(root = %store.root().display(), "using store root");

    let manager = Arc::new(AgentManager::new(store, ManagerConfig::default()));
    let recovered = manager.recover()?;
    if recovered > 0 {
        tracing::info!(count = recovered, "recovered persisted agents");
    }

    // SIGTERM/SIGINT drain the pool before the process exits
    {
        let manager = manager.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            tracing::info!("shutdown signal received; stopping agents");
            manager.shutdown().await;
            std::process::exit(0);
        });
    }

    run_server(manager).await
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn agents(task: Option<String>, all: bool) -> Result<()> {
    let store = EventStore::open_default();
    let mut records = store.load_all().map_err(anyhow::Error::from)?;
    if let Some(task) = &task {
        records.retain(|r| &r.task_name == task);
    }
    if !all {
        records.retain(|r| r.status == AgentStatus::Running);
    }
    records.sort_by(|a, b| a.started_at.cmp(&b.started_at));

    if records.is_empty() && !all {
        println!("No running agents. Pass --all to include finished agents.");
        return Ok(());
    }
    output::print_agents(&records);
    Ok(())
}

fn tasks(limit: usize) -> Result<()> {
    let store = EventStore::open_default();
    let records = store.load_all().map_err(anyhow::Error::from)?;
    let rollups = agmux_engine::aggregate_tasks(&records, chrono::Utc::now(), limit);
    output::print_tasks(&rollups);
    Ok(())
}
