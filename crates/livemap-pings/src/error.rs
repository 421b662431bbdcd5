use thiserror::Error;

#[derive(Debug, Error)]
pub enum PingError {
    /// Network failure or timeout. The request URL is stripped so the bot
    /// token never reaches logs.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered with `"ok": false`.
    #[error("Telegram API error: {description}")]
    Api {
        error_code: Option<i64>,
        description: String,
    },

    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("giving up after {attempts} consecutive polling failures: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<PingError>,
    },
}
