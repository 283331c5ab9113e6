//! apkinspect CLI entry point
//!
//! Parses arguments, initialises logging and dispatches to the command
//! handlers. Reports go to stdout, logs to stderr, so JSON output stays
//! machine-readable.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = cli.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = %cli.config.display(), "apkinspect starting");

    apkinspect_core::metrics::describe_all();

    let writer = OutputWriter::new(cli.output);

    let result = match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &cli.config, &writer).await,
        Commands::Query(args) => commands::query::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}
