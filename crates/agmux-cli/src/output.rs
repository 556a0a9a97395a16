use agmux_engine::TaskRollup;
use agmux_types::{AgentRecord, AgentStatus, format_duration};
use chrono::Utc;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

fn status_cell(status: AgentStatus, color: bool) -> String {
    if !color {
        return status.to_string();
    }
    match status {
        AgentStatus::Running => status.to_string().green().to_string(),
        AgentStatus::Completed => status.to_string().blue().to_string(),
        AgentStatus::Failed => status.to_string().red().to_string(),
        AgentStatus::Stopped => status.to_string().yellow().to_string(),
    }
}

pub fn print_agents(records: &[AgentRecord]) {
    if records.is_empty() {
        println!("No agents found.");
        return;
    }

    let color = use_color();
    let now = Utc::now();
    println!(
        "{:<34} {:<10} {:<10} {:<9} {}",
        "AGENT", "TYPE", "STATUS", "DURATION", "TASK"
    );
    for record in records {
        println!(
            "{:<34} {:<10} {:<10} {:<9} {}",
            record.agent_id,
            record.kind.as_str(),
            status_cell(record.status, color),
            format_duration(record.duration(now)),
            record.task_name,
        );
    }
}

pub fn print_tasks(rollups: &[TaskRollup]) {
    if rollups.is_empty() {
        println!("No tasks found.");
        return;
    }

    let color = use_color();
    println!(
        "{:<24} {:>6} {:>8} {:>10} {:>7} {:>8}  {}",
        "TASK", "AGENTS", "RUNNING", "COMPLETED", "FAILED", "STOPPED", "LAST ACTIVITY"
    );
    for rollup in rollups {
        let running = if color && rollup.running > 0 {
            rollup.running.to_string().green().to_string()
        } else {
            rollup.running.to_string()
        };
        println!(
            "{:<24} {:>6} {:>8} {:>10} {:>7} {:>8}  {}",
            rollup.task_name,
            rollup.agent_count,
            running,
            rollup.completed,
            rollup.failed,
            rollup.stopped,
            rollup.modified_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
}
