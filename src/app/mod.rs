//! Flag-mode / interactive driver for the search-and-archive workflow.
//!
//! The driver resolves the user name, then either runs exactly one session
//! (author supplied via flag) or loops an explicit prompt sequence:
//! Prompting -> Searching -> Prompting, until an empty author input ends
//! the program. Prompts are plain line reads over generic handles so the
//! loop is testable with in-memory buffers.

use std::io::{BufRead, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::download::HttpClient;
use crate::search::SearchClient;
use crate::session::{SessionCounter, SessionError, run_session};

const USER_PROMPT: &str = "Enter your name: ";
const AUTHOR_PROMPT: &str = "Enter the name of the author (or press Enter to quit): ";
const COMMUNITY_PROMPT: &str = "Enter the name of the community (or press Enter to skip): ";

/// Errors raised by the driver.
#[derive(Debug, Error)]
pub enum AppError {
    /// A session failed; the program ends.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reading or writing an interactive prompt failed.
    #[error("cannot use interactive terminal: {source}")]
    Prompt {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Inputs resolved from the command line.
#[derive(Debug, Default, Clone)]
pub struct DriverOptions {
    /// Author filter; presence selects flag mode.
    pub author: Option<String>,
    /// Community filter.
    pub community: Option<String>,
    /// Operator name recorded in session summaries.
    pub user: Option<String>,
}

/// Runs the driver over the given input/output handles.
///
/// # Errors
///
/// Returns [`AppError`] when a prompt cannot be read or a session fails.
/// Sessions completed before the failure keep their output.
pub async fn run_with_io<R: BufRead, W: Write>(
    options: &DriverOptions,
    search: &SearchClient,
    http: &HttpClient,
    results_root: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<(), AppError> {
    let user_name = match &options.user {
        Some(user) => user.clone(),
        None => prompt(input, output, USER_PROMPT)?,
    };

    let mut counter = SessionCounter::new();

    if let Some(author) = &options.author {
        // Flag mode: one session, then done.
        let outcome = run_session(
            &mut counter,
            search,
            http,
            Some(author),
            options.community.as_deref(),
            &user_name,
            results_root,
        )
        .await?;
        info!(
            records = outcome.records_processed,
            archives = outcome.archives_downloaded,
            path = %outcome.session_path.display(),
            "search complete"
        );
        return Ok(());
    }

    loop {
        let author = prompt(input, output, AUTHOR_PROMPT)?;
        if author.is_empty() {
            info!("no author given, exiting");
            return Ok(());
        }
        let community = prompt(input, output, COMMUNITY_PROMPT)?;
        let community = (!community.is_empty()).then_some(community);

        let outcome = run_session(
            &mut counter,
            search,
            http,
            Some(&author),
            community.as_deref(),
            &user_name,
            results_root,
        )
        .await?;
        info!(
            records = outcome.records_processed,
            archives = outcome.archives_downloaded,
            path = %outcome.session_path.display(),
            "search complete"
        );
    }
}

/// Writes `message` and reads one trimmed input line. EOF reads as empty
/// input, which the caller treats as "quit".
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> Result<String, AppError> {
    output
        .write_all(message.as_bytes())
        .and_then(|()| output.flush())
        .map_err(|source| AppError::Prompt { source })?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|source| AppError::Prompt { source })?;
    Ok(line.trim().to_string())
}
