//! mdview CLI - Markdown preview with asynchronous Mermaid rendering.
//!
//! Provides commands for:
//! - `render`: Render a markdown file to HTML, filling in diagrams
//! - `lines`: Render a file as numbered, escaped source lines
//! - `watch`: Re-render a markdown file to HTML whenever it changes

mod commands;
mod engine;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{LinesArgs, RenderArgs, WatchArgs};
use error::CliError;
use output::Output;

/// mdview - Markdown preview with asynchronous Mermaid rendering.
#[derive(Parser)]
#[command(name = "mdview", version, about)]
struct Cli {
    /// Enable verbose output (show render progress and diagram warnings).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to HTML.
    Render(RenderArgs),
    /// Render a file as numbered source lines.
    Lines(LinesArgs),
    /// Watch a markdown file and re-render it on every change.
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli.command) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Render(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(args.execute())
        }
        Commands::Lines(args) => args.execute(),
        Commands::Watch(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(args.execute())
        }
    }
}
