//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Search Zenodo for author/community records, download and extract their
/// archives.
///
/// With `--author-name` the tool runs a single search and exits; without
/// it, author and community are prompted for in a loop until an empty
/// author input quits.
#[derive(Parser, Debug)]
#[command(name = "zenodo-archiver")]
#[command(author, version, about)]
pub struct Args {
    /// Author name to filter records by (flag mode: run one search, then exit)
    #[arg(short = 'a', long, visible_alias = "authorName")]
    pub author_name: Option<String>,

    /// Community name to filter records by
    #[arg(short = 'c', long, visible_alias = "communityName")]
    pub community_name: Option<String>,

    /// Operator name recorded in session summaries
    #[arg(short = 'u', long, visible_alias = "userName")]
    pub user_name: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
