//! Pipewright CLI - validate, compile and format pipeline descriptors.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pipewright_core::Category;
use pipewright_engine::codegen::ArtifactKind;
use pipewright_engine::observability::{TracingConfig, TracingGuard, init_tracing};
use std::path::PathBuf;

/// Pipewright - ETL pipeline validator and SQL compiler.
#[derive(Parser)]
#[command(name = "pipewright")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Engine config file (defaults to $PIPEWRIGHT_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pipeline descriptor
    Validate {
        /// Path to the pipeline JSON file
        file: PathBuf,
    },

    /// Compile a pipeline descriptor to SQL or canonical JSON
    Compile {
        /// Path to the pipeline JSON file
        file: PathBuf,

        /// Output kind (sql or json)
        #[arg(short, long, default_value = "sql")]
        target: ArtifactKind,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a pipeline descriptor in canonical form
    Fmt {
        /// Path to the pipeline JSON file
        file: PathBuf,

        /// Fail if the file is not canonical instead of rewriting it
        #[arg(long)]
        check: bool,
    },

    /// List available node types
    Types {
        /// Only show one category (source, transform, qualityCheck, target)
        #[arg(long)]
        category: Option<Category>,
    },
}

fn setup_logging(verbosity: u8) -> Result<TracingGuard> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v
    init_tracing(TracingConfig::from_env(filter))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _tracing_guard = setup_logging(cli.verbose)?;
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { file } => commands::validate::run(&file, &config),
        Commands::Compile {
            file,
            target,
            output,
        } => commands::compile::run(&file, target, output.as_deref(), &config),
        Commands::Fmt { file, check } => commands::fmt::run(&file, check, &config),
        Commands::Types { category } => commands::types::run(category, &config),
    }
}
