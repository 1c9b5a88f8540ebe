//! HTTP download support for record files.

pub mod client;
pub mod constants;
pub mod error;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::DownloadError;
