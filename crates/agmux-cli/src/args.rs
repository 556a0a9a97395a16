use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "agmux",
    version,
    about = "Supervisor and event aggregator for AI coding-agent CLIs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the MCP tool server on stdio
    Serve,

    /// List agents from the store
    Agents {
        /// Only show agents belonging to this task
        #[arg(long)]
        task: Option<String>,

        /// Include finished agents (the default view shows running only)
        #[arg(long)]
        all: bool,
    },

    /// Summarize tasks by recent activity
    Tasks {
        /// Maximum number of tasks to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}
