//! Tribuna CLI — the main entry point.
//!
//! Commands:
//! - `serve`  — Start the HTTP API server
//! - `ask`    — Run one chat turn in the terminal
//! - `ingest` — Replace the knowledge base with a PDF
//! - `doctor` — Check configuration and backends

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tribuna",
    about = "Tribuna — campaign chatbot for Dr. Wilmer Gálvez",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (defaults to ./tribuna.toml when present)
    #[arg(short, long, global = true, env = "TRIBUNA_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask one question and stream the answer
    Ask {
        /// The question for the candidate
        message: String,
    },

    /// Replace the knowledge base with the contents of a PDF
    Ingest {
        /// Path to the PDF file
        file: PathBuf,
    },

    /// Check configuration, planner and knowledge store
    Doctor {
        /// Print the default configuration as TOML and exit
        #[arg(long)]
        print_defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask { message } => commands::ask::run(config_path, message).await?,
        Commands::Ingest { file } => commands::ingest::run(config_path, &file).await?,
        Commands::Doctor { print_defaults } => commands::doctor::run(config_path, print_defaults).await?,
    }

    Ok(())
}
