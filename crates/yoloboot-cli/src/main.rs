mod cmd;
mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "yoloboot",
    about = "Container bootstrap orchestrator for the claude-yolo development environment",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bootstrap sequence (container entry)
    Up,

    /// Show enabled/liveness state of the optional services
    Status,

    /// Check binaries, paths, and ports for this environment
    Doctor,

    /// Show the safety log or a per-service log
    Logs {
        /// Service name (omit for the safety log)
        service: Option<String>,

        /// Number of lines to show from the end
        #[arg(long, default_value = "100")]
        tail: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Up => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Up => cmd::up::run(cli.json),
        Commands::Status => cmd::status::run(cli.json),
        Commands::Doctor => cmd::doctor::run(cli.json),
        Commands::Logs { service, tail } => cmd::logs::run(service.as_deref(), tail),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
