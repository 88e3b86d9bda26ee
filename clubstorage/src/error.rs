//! Error types for the storage resolver

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry a path (e.g. `mailto:`)
    #[error("Base URL cannot be used for storage requests: {0}")]
    InvalidBaseUrl(String),

    /// Empty object key
    #[error("Object key must not be empty")]
    EmptyKey,

    /// The storage API answered with an error status
    #[error("Storage API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The signing endpoint answered without a URL for this key
    #[error("No signed URL returned for {0}")]
    MissingSignedUrl(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
