use thiserror::Error;

/// Failures that abort a feed fetch. Per-entry problems never surface here;
/// they degrade to empty or sentinel fields inside the snapshot.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Well-formed XML that is not a usable feed document.
    #[error("feed decode error: {0}")]
    Decode(String),
}

impl FeedError {
    /// `true` when the document arrived but could not be decoded.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Xml(_) | Self::Decode(_))
    }
}
