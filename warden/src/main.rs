// warden/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden_core::WardenError;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug warden check ... to see per-pass details
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command).await {
        // Core errors carry miette codes and help text, everything else is plain
        match e.downcast::<WardenError>() {
            Ok(err) => eprintln!("{:?}", miette::Report::new(err)),
            Err(other) => eprintln!("❌ Error: {:#}", other),
        }
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        // --- USE CASE: CHECK ---
        Commands::Check {
            project_dir,
            config,
            format,
            strict,
        } => {
            tracing::debug!(dir = ?project_dir, ?format, strict, "check");
            commands::check::execute(project_dir, config, format, strict).await
        }

        // --- USE CASE: FIX ---
        Commands::Fix {
            project_dir,
            dry_run,
        } => {
            tracing::debug!(dir = ?project_dir, dry_run, "fix");
            commands::fix::execute(project_dir, dry_run).await
        }

        // --- USE CASE: LIST ---
        Commands::List => commands::list::execute(),
    }
}
