//! wikipub CLI - publish a documentation tree to Confluence.
//!
//! Provides commands for:
//! - `publish`: Sync the local page tree to a Confluence space
//! - `publish --dry-run`: Render every page without contacting Confluence

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wikipub_sync::error_chain;

use commands::PublishArgs;
use output::Output;

/// wikipub - documentation tree publisher.
#[derive(Parser)]
#[command(name = "wikipub", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the page tree to Confluence.
    Publish(PublishArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Publish(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Publish(args) => args.execute(),
    };

    if let Err(err) = result {
        output.fatal(&error_chain(&err));
        std::process::exit(1);
    }
}
