use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use valet::cli;
use valet::config::ValetConfig;

#[derive(Parser)]
#[command(name = "valet", version, about = "Personal AI assistant with persistent memory")]
struct Cli {
    /// Minimal production rendering: reply panels instead of verbose logs
    #[arg(short = 'p', long = "prod", global = true)]
    prod: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive chat (the default)
    Chat,
    /// Search the stores directly, skipping the model
    Search {
        query: String,
        /// Search tasks instead of memories
        #[arg(long)]
        tasks: bool,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show entry counts and storage sizes
    Stats,
    /// Delete all stored memories and tasks
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ValetConfig::load()?;

    // Verbose traces by default; production mode keeps the terminal quiet.
    let level = if cli.prod {
        "warn".to_string()
    } else {
        config.assistant.log_level.clone()
    };
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => cli::run_chat(config, cli.prod).await,
        Command::Search {
            query,
            tasks,
            limit,
        } => cli::run_search(&config, &query, tasks, limit).await,
        Command::Stats => cli::run_stats(&config).await,
        Command::Reset { yes } => cli::run_reset(&config, yes),
    }
}
