//! Access token loading for the Zenodo records API.
//!
//! Every search request is authenticated, so the token is loaded once at
//! startup and a missing token file is fatal before any work begins.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Default location of the plaintext access token, relative to the
/// working directory.
pub const DEFAULT_TOKEN_PATH: &str = "zenodoToken/access_token.txt";

/// Errors raised while loading the access token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token file could not be read (missing file, permissions, etc.)
    #[error("cannot read access token from {path}: {source}")]
    TokenFile {
        /// Path that was attempted.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Reads the access token from `path`, normalizing CRLF line endings and
/// trimming surrounding whitespace.
///
/// # Errors
///
/// Returns [`AuthError::TokenFile`] if the file cannot be read.
pub fn load_access_token(path: &Path) -> Result<String, AuthError> {
    let raw = std::fs::read_to_string(path).map_err(|source| AuthError::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let token = raw.replace("\r\n", "\n").trim().to_string();
    debug!(path = %path.display(), "access token loaded");
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_load_access_token_trims_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access_token.txt");
        std::fs::write(&path, "  abc123token  \n").unwrap();

        let token = load_access_token(&path).unwrap();
        assert_eq!(token, "abc123token");
    }

    #[test]
    fn test_load_access_token_normalizes_crlf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access_token.txt");
        std::fs::write(&path, "abc123token\r\n").unwrap();

        let token = load_access_token(&path).unwrap();
        assert_eq!(token, "abc123token");
    }

    #[test]
    fn test_load_access_token_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does_not_exist.txt");

        let result = load_access_token(&path);
        match result {
            Err(AuthError::TokenFile { path: p, .. }) => {
                assert!(p.ends_with("does_not_exist.txt"));
            }
            other => panic!("Expected TokenFile error, got: {other:?}"),
        }
    }

    #[test]
    fn test_token_file_error_display_includes_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = AuthError::TokenFile {
            path: PathBuf::from("zenodoToken/access_token.txt"),
            source: io_error,
        };
        let msg = error.to_string();
        assert!(msg.contains("access_token.txt"), "Expected path in: {msg}");
    }
}
