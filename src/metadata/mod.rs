//! Record metadata projection and persistence.
//!
//! [`RecordMetadata`] is the fixed subset of a remote record's metadata
//! that gets persisted locally, independent of any fields the API may add.
//! Absent fields are tolerated and omitted from serialized output.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// File name of the per-record metadata file.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Errors raised while persisting record metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Writing the metadata file failed.
    #[error("IO error writing metadata to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing the metadata failed.
    #[error("cannot serialize record metadata: {source}")]
    Serialize {
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Fixed projection of a remote record's metadata.
///
/// Deserializing the remote `metadata` object into this struct *is* the
/// projection: unknown remote fields are dropped, absent fields stay
/// `None` and are skipped on output. Only `title` is given a concrete
/// type, since it feeds the archive file name; everything else is passed
/// through verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creators: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_right: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embargo_date: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_conditions: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prereserve_doi: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_identifiers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communities: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grants: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_title: Option<Value>,
}

impl RecordMetadata {
    /// Writes this metadata as pretty-printed JSON to
    /// `metadata.json` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] if serialization or the write fails.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, MetadataError> {
        let path = dir.join(METADATA_FILE_NAME);
        let body = serde_json::to_string_pretty(self)
            .map_err(|source| MetadataError::Serialize { source })?;
        std::fs::write(&path, body).map_err(|source| MetadataError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "record metadata written");
        Ok(path)
    }
}
