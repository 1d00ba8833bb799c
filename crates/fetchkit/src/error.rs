//! Error types for fetch and extraction operations.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error carried by a failed download attempt.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL argument was neither a single URL nor a list of URLs.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single URL attempt failed. The partial destination file has been removed.
    #[error("Network error for {url}: {source}")]
    Network {
        /// URL of the failed attempt
        url: String,
        /// Underlying transport or I/O failure
        #[source]
        source: BoxError,
    },

    /// Every URL in a fallback list failed.
    #[error("Failed to download {}: all candidate URLs failed", destination.display())]
    AllCandidatesExhausted {
        /// Destination that could not be produced
        destination: PathBuf,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// An I/O error occurred before any download attempt.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Wraps any failure of a single URL attempt.
    pub fn network(url: &str, source: impl Into<BoxError>) -> Self {
        Self::Network {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

/// Error type for extraction and probing operations.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Archive file not found at the specified path.
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    /// The archive format is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The zip archive could not be read.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An entry name failed path validation.
    #[error("Security violation: {0}")]
    Security(#[from] SecurityError),

    /// The archive was extracted but could not be removed afterwards.
    #[error("Failed to delete archive {}: {source}", path.display())]
    DeleteArchive {
        /// Archive that was left behind
        path: PathBuf,
        /// Underlying removal failure
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred during extraction.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Security-related errors for archive entry names.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Path traversal attempt detected (e.g., "../../../etc/passwd").
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    /// Absolute path not allowed in archive entries.
    #[error("Absolute path not allowed: {0}")]
    AbsolutePath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_candidates_exhausted_names_destination() {
        let err = FetchError::AllCandidatesExhausted {
            destination: PathBuf::from("/tmp/premake.zip"),
        };
        assert!(err.to_string().contains("/tmp/premake.zip"));
    }

    #[test]
    fn test_network_error_keeps_url() {
        let err = FetchError::network("https://example.com/a.zip", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/a.zip"));
        assert!(msg.contains("connection refused"));
    }
}
