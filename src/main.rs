//! CLI entry point for the zenodo-archiver tool.

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use zenodo_archiver_core::app::{DriverOptions, run_with_io};
use zenodo_archiver_core::session::RESULTS_ROOT;
use zenodo_archiver_core::{DEFAULT_TOKEN_PATH, HttpClient, SearchClient, load_access_token};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!("Zenodo archiver starting");

    // Every search is authenticated; a missing token file is fatal before
    // any prompt is shown.
    let token = load_access_token(Path::new(DEFAULT_TOKEN_PATH))?;

    let search = SearchClient::new(token);
    let http = HttpClient::new();
    // Empty-string flags behave like absent flags: an empty author still
    // selects interactive mode, an empty community means no filter.
    let options = DriverOptions {
        author: args.author_name.filter(|s| !s.is_empty()),
        community: args.community_name.filter(|s| !s.is_empty()),
        user: args.user_name.filter(|s| !s.is_empty()),
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    run_with_io(
        &options,
        &search,
        &http,
        Path::new(RESULTS_ROOT),
        &mut input,
        &mut output,
    )
    .await?;

    Ok(())
}
