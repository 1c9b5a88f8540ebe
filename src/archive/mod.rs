//! Per-record directory trees and archive extraction.
//!
//! Every record gets an isolated three-directory tree under the session
//! folder: `Content/` for the raw downloaded archive, `Decompressed/` for
//! its extracted contents, and `metadataFile/` for the metadata file.
//! Trees are created once per record and never cleaned up.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

/// Directory under the session folder holding all record trees.
pub const RESULTS_DIR_NAME: &str = "Results";

/// Prefix of each record folder.
pub const RECORD_DIR_PREFIX: &str = "theZenodo_";

/// Placeholder used when a record carries no title.
pub const MISSING_TITLE: &str = "N/A";

#[allow(clippy::expect_used)]
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("static non-word pattern must compile"));

/// Errors raised while materializing a record's directory tree or
/// extracting its archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// File system error creating directories or reading the archive.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The downloaded file is not a readable zip archive.
    #[error("cannot extract archive {path}: {source}")]
    Zip {
        /// The archive path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The blocking extraction task was cancelled or panicked.
    #[error("archive extraction task failed: {source}")]
    TaskJoin {
        /// The underlying join error.
        #[source]
        source: tokio::task::JoinError,
    },
}

impl ArchiveError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}

/// The three-directory tree of one record.
#[derive(Debug, Clone)]
pub struct RecordDirs {
    /// Record root: `<session>/Results/theZenodo_<id>/`.
    pub root: PathBuf,
    /// Holds the raw downloaded archive.
    pub content: PathBuf,
    /// Holds the extracted archive contents.
    pub decompressed: PathBuf,
    /// Holds the metadata file.
    pub metadata_dir: PathBuf,
}

impl RecordDirs {
    /// Creates the tree for `record_id` under `session_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Io`] if any directory cannot be created.
    pub fn create(session_path: &Path, record_id: u64) -> Result<Self, ArchiveError> {
        let root = session_path
            .join(RESULTS_DIR_NAME)
            .join(format!("{RECORD_DIR_PREFIX}{record_id}"));
        let content = root.join("Content");
        let decompressed = root.join("Decompressed");
        let metadata_dir = root.join("metadataFile");

        for dir in [&root, &content, &decompressed, &metadata_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ArchiveError::io(dir, source))?;
        }

        debug!(record_id, root = %root.display(), "record directory tree created");
        Ok(Self {
            root,
            content,
            decompressed,
            metadata_dir,
        })
    }

    /// Path the record's archive is downloaded to.
    #[must_use]
    pub fn archive_path(&self, title: Option<&str>) -> PathBuf {
        self.content.join(format!("Zip_{}.zip", sanitize_title(title)))
    }
}

/// Rewrites a record title into a filesystem-safe name.
///
/// A missing title resolves to `N/A` first; every character outside
/// `[A-Za-z0-9_]` is then replaced by `_`.
#[must_use]
pub fn sanitize_title(title: Option<&str>) -> String {
    let title = title.unwrap_or(MISSING_TITLE);
    NON_WORD.replace_all(title, "_").into_owned()
}

/// Extracts the zip archive at `archive` into `dest`, blocking work moved
/// off the async runtime. The future resolves only once extraction has
/// fully completed, so callers can safely reference the extracted tree
/// afterwards.
///
/// # Errors
///
/// Returns [`ArchiveError`] if the archive cannot be opened, is not a
/// valid zip, or extraction fails mid-way.
pub async fn extract_archive(archive: PathBuf, dest: PathBuf) -> Result<(), ArchiveError> {
    let result = tokio::task::spawn_blocking(move || -> Result<PathBuf, ArchiveError> {
        let file =
            std::fs::File::open(&archive).map_err(|source| ArchiveError::io(&archive, source))?;
        let mut zip =
            zip::ZipArchive::new(file).map_err(|source| ArchiveError::zip(&archive, source))?;
        zip.extract(&dest)
            .map_err(|source| ArchiveError::zip(&archive, source))?;
        Ok(dest)
    })
    .await
    .map_err(|source| ArchiveError::TaskJoin { source })??;

    info!(dest = %result.display(), "archive extracted");
    Ok(())
}
