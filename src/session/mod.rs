//! Search session orchestration and summary persistence.
//!
//! One session covers one search: number it, timestamp it, fetch the
//! matching records, materialize every record's directory tree, metadata
//! and archive, and finally write the session summary file plus a
//! consolidated `records.json`. Records are processed strictly
//! sequentially, in response order; any failure aborts the whole session
//! and leaves already-created output in place.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, SecondsFormat, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::archive::{ArchiveError, RecordDirs, extract_archive};
use crate::download::{DownloadError, HttpClient};
use crate::metadata::{MetadataError, RecordMetadata};
use crate::search::{SearchClient, SearchError, build_query};

/// Root directory all session folders are created under, relative to the
/// working directory.
pub const RESULTS_ROOT: &str = "resultsSearch";

/// File holding the consolidated metadata list of a session.
pub const RECORDS_FILE_NAME: &str = "records.json";

/// Errors that abort a running session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The search request failed.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A record file download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Directory creation or archive extraction failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A metadata file could not be written.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// A session-level file or directory operation failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The session summary could not be serialized.
    #[error("cannot serialize session summary: {source}")]
    Serialize {
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Monotonic per-process session numbering, owned by the driver and passed
/// into each session start. Both values advance together; they are kept
/// separate because the folder name uses the count and the summary records
/// the id.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionCounter {
    count: u32,
    id: u64,
}

impl SessionCounter {
    /// Creates a counter starting before the first session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to the next session, returning its (count, id).
    pub fn advance(&mut self) -> (u32, u64) {
        self.count += 1;
        self.id += 1;
        (self.count, self.id)
    }
}

/// Result of one completed session.
#[derive(Debug)]
pub struct SessionOutcome {
    /// The session folder everything was written under.
    pub session_path: PathBuf,
    /// Number of records returned by the search.
    pub records_processed: usize,
    /// Number of archives downloaded and extracted.
    pub archives_downloaded: usize,
}

/// Serialized session summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSummary {
    search_id: u64,
    author_name: Option<String>,
    community_name: Option<String>,
    #[serde(rename = "searchStartTimeMS")]
    search_start_time_ms: i64,
    #[serde(rename = "searchEndTimeMS")]
    search_end_time_ms: i64,
    search_start_time: String,
    search_end_time: String,
    user_name: String,
    search_date: String,
    criteria: Vec<RecordMetadata>,
}

/// Runs one search-and-archive session.
///
/// The session folder is created under `results_root`, the search issued,
/// every record processed in order (directory tree, metadata file,
/// download + extraction for the first attached file), and the summary
/// files written. Extraction is awaited per record, so by the time the
/// summary lands every referenced archive is fully unpacked.
///
/// Records that produced an archive are appended to the summary's
/// `criteria` list a second time, so the list distinguishes "seen" from
/// "seen and downloaded" by multiplicity.
///
/// # Errors
///
/// Returns [`SessionError`] on any search, filesystem, download or
/// extraction failure. The session is aborted; output created before the
/// failure is left in place.
pub async fn run_session(
    counter: &mut SessionCounter,
    search: &SearchClient,
    http: &HttpClient,
    author: Option<&str>,
    community: Option<&str>,
    user_name: &str,
    results_root: &Path,
) -> Result<SessionOutcome, SessionError> {
    let (count, id) = counter.advance();
    let started = Local::now();

    let session_path = results_root.join(session_folder_name(count, &started));
    std::fs::create_dir_all(&session_path)
        .map_err(|source| SessionError::io(&session_path, source))?;

    let query = build_query(author, community);
    info!(search_id = id, query = %query, path = %session_path.display(), "session started");

    let hits = search.fetch_records(&query).await?;

    let mut criteria: Vec<RecordMetadata> = Vec::new();
    let mut archives_downloaded = 0usize;

    for hit in &hits {
        let dirs = RecordDirs::create(&session_path, hit.id)?;
        hit.metadata.write_to_dir(&dirs.metadata_dir)?;
        criteria.push(hit.metadata.clone());

        if let Some(file) = hit.files.first() {
            let archive = dirs.archive_path(hit.metadata.title.as_deref());
            http.download_to_path(&file.links.self_url, &archive).await?;
            extract_archive(archive, dirs.decompressed.clone()).await?;
            archives_downloaded += 1;
            criteria.push(hit.metadata.clone());
        } else {
            info!(record_id = hit.id, "record has no files to download");
        }
    }

    let ended = Local::now();
    let summary = SessionSummary {
        search_id: id,
        author_name: author.map(ToString::to_string),
        community_name: community.map(ToString::to_string),
        search_start_time_ms: started.timestamp_millis(),
        search_end_time_ms: ended.timestamp_millis(),
        search_start_time: iso_utc(&started),
        search_end_time: iso_utc(&ended),
        user_name: user_name.to_string(),
        search_date: started.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        criteria,
    };

    let summary_path = session_path.join(summary_file_name(
        author,
        community,
        summary.search_start_time_ms,
        summary.search_end_time_ms,
        user_name,
        &summary.search_date,
    ));
    let body =
        serde_json::to_string(&summary).map_err(|source| SessionError::Serialize { source })?;
    std::fs::write(&summary_path, body)
        .map_err(|source| SessionError::io(&summary_path, source))?;

    if summary.criteria.is_empty() {
        warn!(search_id = id, "search matched no records");
    } else {
        let records_path = session_path.join(RECORDS_FILE_NAME);
        let body = serde_json::to_string_pretty(&summary.criteria)
            .map_err(|source| SessionError::Serialize { source })?;
        std::fs::write(&records_path, body)
            .map_err(|source| SessionError::io(&records_path, source))?;
    }

    info!(
        search_id = id,
        records = hits.len(),
        archives = archives_downloaded,
        "session closed"
    );

    Ok(SessionOutcome {
        session_path,
        records_processed: hits.len(),
        archives_downloaded,
    })
}

/// Session folder name: `Search_<n>_<d>_<m>_<y>_<h>h<min>m<s>s`, from the
/// local start time.
fn session_folder_name(count: u32, started: &DateTime<Local>) -> String {
    format!(
        "Search_{count}_{}_{}_{}_{}h{}m{}s",
        started.day(),
        started.month(),
        started.year(),
        started.hour(),
        started.minute(),
        started.second()
    )
}

/// Summary file name:
/// `<author>_<community>_<startMs>_<endMs>_<user>_<YYYY-MM-DD>.json`,
/// with every `:` replaced by `-` for filesystem safety. Absent filters
/// render as the literal `null`.
fn summary_file_name(
    author: Option<&str>,
    community: Option<&str>,
    start_ms: i64,
    end_ms: i64,
    user_name: &str,
    date: &str,
) -> String {
    let author = author.unwrap_or("null");
    let community = community.unwrap_or("null");
    format!("{author}_{community}_{start_ms}_{end_ms}_{user_name}_{date}.json").replace(':', "-")
}

fn iso_utc(instant: &DateTime<Local>) -> String {
    instant
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn test_session_counter_advances_both_values_together() {
        let mut counter = SessionCounter::new();
        assert_eq!(counter.advance(), (1, 1));
        assert_eq!(counter.advance(), (2, 2));
        assert_eq!(counter.advance(), (3, 3));
    }

    #[test]
    fn test_session_folder_name_format() {
        let started = Local.with_ymd_and_hms(2026, 8, 6, 9, 5, 3).unwrap();
        assert_eq!(session_folder_name(4, &started), "Search_4_6_8_2026_9h5m3s");
    }

    #[test]
    fn test_summary_file_name_shape() {
        let name = summary_file_name(
            Some("Ada Lovelace"),
            Some("zenodo"),
            1000,
            2000,
            "tester",
            "2026-08-06",
        );
        assert_eq!(name, "Ada Lovelace_zenodo_1000_2000_tester_2026-08-06.json");
    }

    #[test]
    fn test_summary_file_name_never_contains_colon() {
        let name = summary_file_name(
            Some("a:uthor"),
            Some("c:ommunity"),
            1000,
            2000,
            "u:ser",
            "2026-08-06",
        );
        assert!(!name.contains(':'), "Expected no colon in: {name}");
        assert_eq!(name, "a-uthor_c-ommunity_1000_2000_u-ser_2026-08-06.json");
    }

    #[test]
    fn test_summary_file_name_absent_filters_render_null() {
        let name = summary_file_name(Some("Ada"), None, 1, 2, "tester", "2026-08-06");
        assert_eq!(name, "Ada_null_1_2_tester_2026-08-06.json");
    }

    #[test]
    fn test_summary_serializes_with_expected_field_names() {
        let summary = SessionSummary {
            search_id: 3,
            author_name: Some("Ada".to_string()),
            community_name: None,
            search_start_time_ms: 1000,
            search_end_time_ms: 2000,
            search_start_time: "2026-08-06T09:05:03.000Z".to_string(),
            search_end_time: "2026-08-06T09:05:04.000Z".to_string(),
            user_name: "tester".to_string(),
            search_date: "2026-08-06".to_string(),
            criteria: Vec::new(),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["searchId"], 3);
        assert_eq!(value["authorName"], "Ada");
        assert_eq!(value["communityName"], serde_json::Value::Null);
        assert_eq!(value["searchStartTimeMS"], 1000);
        assert_eq!(value["searchEndTimeMS"], 2000);
        assert_eq!(value["userName"], "tester");
        assert_eq!(value["searchDate"], "2026-08-06");
        assert_eq!(value["criteria"], serde_json::json!([]));
    }

    #[test]
    fn test_iso_utc_matches_javascript_to_iso_string_shape() {
        let instant = Local.with_ymd_and_hms(2026, 8, 6, 9, 5, 3).unwrap();
        let iso = iso_utc(&instant);
        assert!(iso.ends_with('Z'), "Expected trailing Z in: {iso}");
        // YYYY-MM-DDTHH:MM:SS.mmmZ
        assert_eq!(iso.len(), 24, "Unexpected shape: {iso}");
    }
}
