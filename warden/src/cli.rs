// warden/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Source-code governance engine for the storefront project", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🛡️  Runs every enabled validator and writes the Markdown report
    Check {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Explicit configuration file (default: warden.yaml in the project)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Console output: markdown summary table | json report
        #[arg(long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Exit with error if any validator failed
        #[arg(long)]
        strict: bool,
    },

    /// 🔧 Applies the pending automatic fixes
    Fix {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// List the files that would change without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// 📋 Lists the registered validators
    List,
}
