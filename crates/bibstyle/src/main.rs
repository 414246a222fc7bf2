//! bibstyle CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "bibstyle")]
#[command(version)]
#[command(about = "Run bibliography style programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a style program against a bibliography database
    Run {
        /// Program tree (JSON)
        #[arg(short, long)]
        program: PathBuf,

        /// Bibliography database (JSON)
        #[arg(short, long)]
        database: PathBuf,

        /// Engine options (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Treat assignment to an undeclared variable as an error
        #[arg(long)]
        strict: bool,

        /// Maximum nesting of user-defined function calls
        #[arg(long)]
        max_depth: Option<usize>,

        /// Write output to FILE instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the built-in operations and their operand counts
    Builtins,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibstyle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            program,
            database,
            config,
            strict,
            max_depth,
            output,
        } => commands::run::execute(commands::run::RunArgs {
            program,
            database,
            config,
            strict,
            max_depth,
            output,
        }),
        Commands::Builtins => commands::builtins::execute(),
    }
}
