use thiserror::Error;

/// Failure of a single store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Built with the request URL stripped; it carries the `auth` token.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `path` never includes the query string, so auth tokens stay out of logs.
    #[error("unexpected HTTP status {status} for {method} {path}")]
    UnexpectedStatus {
        status: u16,
        method: String,
        path: String,
    },

    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid store key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("invalid store URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
