//! hostbind CLI
//!
//! Generates script binding tables outside of a build script: one-shot
//! generation, a dry-run check, and a watch mode that regenerates on change.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "hostbind")]
#[command(about = "Generate script binding tables for host types", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate binding tables and the registry
    Generate {
        /// Source roots (directories) or single crate-root files
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
        /// Also write the registry manifest as JSON
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Discover and synthesize without writing anything
    Check {
        /// Source roots (directories) or single crate-root files
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Print the registry manifest as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Regenerate whenever a source file changes
    Watch {
        /// Source roots (directories) or single crate-root files
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
        /// Also write the registry manifest as JSON
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Quiet period before a change triggers a run, in milliseconds
        #[arg(long, default_value_t = 100)]
        debounce_ms: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            sources,
            out,
            manifest,
        } => commands::generate::execute(&sources, &out, manifest.as_deref()),

        Commands::Check { sources, json } => commands::check::execute(&sources, json),

        Commands::Watch {
            sources,
            out,
            manifest,
            debounce_ms,
        } => commands::watch::execute(sources, out, manifest, debounce_ms),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
