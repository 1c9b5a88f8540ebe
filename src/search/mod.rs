//! Query construction and the Zenodo records search request.
//!
//! One authenticated GET against the records endpoint returns the first
//! (and only) page of hits. There is no pagination and no retry: a
//! transport failure or non-2xx status aborts the current session.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::metadata::RecordMetadata;

/// Production records search endpoint.
pub const ZENODO_RECORDS_ENDPOINT: &str = "https://zenodo.org/api/records";

/// Errors raised by the search request.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure (DNS, connection refused, TLS, timeout).
    #[error("network error querying {endpoint}: {source}")]
    Network {
        /// Endpoint that was queried.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status} from {endpoint} for query {query:?}")]
    HttpStatus {
        /// Endpoint that was queried.
        endpoint: String,
        /// The search query that was sent.
        query: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded as a search response.
    #[error("malformed search response from {endpoint}: {source}")]
    Body {
        /// Endpoint that was queried.
        endpoint: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

/// One record hit from the search response.
///
/// The metadata block is deserialized straight into the fixed
/// [`RecordMetadata`] projection; fields the remote API adds beyond that
/// set are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordHit {
    /// Remote record identifier.
    pub id: u64,
    /// Projected record metadata.
    pub metadata: RecordMetadata,
    /// Attached files; only the first is ever downloaded.
    #[serde(default)]
    pub files: Vec<RecordFile>,
}

/// One attached file of a record.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordFile {
    /// Link block carrying the downloadable URL.
    pub links: FileLinks,
}

/// Links of an attached file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileLinks {
    /// Direct download URL for the file content.
    #[serde(rename = "self")]
    pub self_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<RecordHit>,
}

/// Builds the search query string from the optional filters.
///
/// An author filter becomes an exact-match clause on the creator name
/// field, a community filter an exact-match clause on `communities`; both
/// present are joined with ` AND `. Neither present yields the empty
/// query, which the API treats as an unfiltered search.
#[must_use]
pub fn build_query(author: Option<&str>, community: Option<&str>) -> String {
    let mut query = String::new();
    if let Some(author) = author {
        query = format!("metadata.creators.person_or_org.name:\"{author}\"");
    }
    if let Some(community) = community {
        if !query.is_empty() {
            query.push_str(" AND ");
        }
        query.push_str(&format!("communities:\"{community}\""));
    }
    query
}

/// Client for the records search endpoint.
///
/// Holds the access token and a pooled `reqwest` client; created once per
/// process and reused across sessions.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl SearchClient {
    /// Creates a client against the production endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new(access_token: String) -> Self {
        Self::with_endpoint(access_token, ZENODO_RECORDS_ENDPOINT)
    }

    /// Creates a client against an explicit endpoint (used by tests).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_endpoint(access_token: String, endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            endpoint: endpoint.into(),
            access_token,
        }
    }

    /// Fetches the first page of record hits for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport failure, non-2xx status, or an
    /// undecodable body.
    pub async fn fetch_records(&self, query: &str) -> Result<Vec<RecordHit>, SearchError> {
        debug!(endpoint = %self.endpoint, query = %query, "issuing search request");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("access_token", self.access_token.as_str()), ("q", query)])
            .send()
            .await
            .map_err(|source| SearchError::Network {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                endpoint: self.endpoint.clone(),
                query: query.to_string(),
                status: status.as_u16(),
            });
        }

        let body: SearchResponse =
            response
                .json()
                .await
                .map_err(|source| SearchError::Body {
                    endpoint: self.endpoint.clone(),
                    source,
                })?;

        info!(hits = body.hits.hits.len(), "search response received");
        Ok(body.hits.hits)
    }
}
