use agmux::{Cli, Commands, run};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // The MCP server must survive EPIPE on stdout (Rust's default ignore);
    // the human-facing views take the usual die-on-broken-pipe behavior so
    // piping to `head` or `less` stays quiet.
    #[cfg(unix)]
    if !matches!(cli.command, Commands::Serve) {
        reset_sigpipe();
    }

    // Diagnostics go to stderr; stdout belongs to the MCP wire.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
