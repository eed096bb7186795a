//! Command-line entry point for the Design-by-Contract weaver
//!
//! Usage: dbc-weave weave <paths>... [--cache-dir DIR] [--force]
//!        dbc-weave inspect <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "dbc-weave")]
#[command(about = "Design-by-Contract weaver for PHP sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weave contract checks into the given files or directories
    Weave {
        /// Files or directories containing source units
        paths: Vec<PathBuf>,

        /// Directory the woven output is cached in
        #[arg(long, default_value = ".dbc-cache")]
        cache_dir: PathBuf,

        /// Re-weave even when the cache entry is still fresh
        #[arg(long)]
        force: bool,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Show the structure and contracts the parser recovers from a unit
    Inspect {
        /// Source unit to inspect
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Weave {
            paths,
            cache_dir,
            force,
            format,
        } => cli::weave::handle_weave(paths, &cache_dir, force, format),
        Commands::Inspect { path, format } => cli::inspect::handle_inspect(&path, format),
    };

    std::process::exit(exit_code);
}
