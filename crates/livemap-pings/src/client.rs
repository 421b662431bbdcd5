//! Minimal Telegram Bot API client: `getUpdates` long polling only.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::PingError;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org/";

/// Extra time allowed on top of the long-poll window before the HTTP request
/// itself times out.
const REQUEST_GRACE_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
}

impl Update {
    /// Text of the chat message or channel post, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .or(self.channel_post.as_ref())
            .and_then(|m| m.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// # Errors
    ///
    /// Returns [`PingError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self, PingError> {
        Self::with_base_url(token, poll_timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom API root (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PingError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PingError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        token: &str,
        poll_timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + REQUEST_GRACE_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| PingError::Api {
            error_code: None,
            description: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            client,
            base_url,
            token: token.to_owned(),
        })
    }

    fn updates_url(&self, offset: i64, timeout_secs: u64) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty();
            parts.push(&format!("bot{}", self.token));
            parts.push("getUpdates");
        }
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("timeout", &timeout_secs.to_string());
        url
    }

    /// Long-polls for updates with `update_id >= offset`, waiting up to
    /// `timeout_secs` for new ones.
    ///
    /// # Errors
    ///
    /// - [`PingError::Http`] on network failure or timeout.
    /// - [`PingError::Api`] when the response has `"ok": false`.
    /// - [`PingError::Deserialize`] when the body is not a Bot API envelope.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, PingError> {
        let url = self.updates_url(offset, timeout_secs);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|source| PingError::Deserialize {
                context: format!("getUpdates response (HTTP {})", status.as_u16()),
                source,
            })?;

        if !envelope.ok {
            return Err(PingError::Api {
                error_code: envelope.error_code,
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_owned()),
            });
        }
        Ok(envelope.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_url_embeds_token_and_long_poll_params() {
        let client = TelegramClient::with_base_url("123:abc", 30, "https://api.telegram.org")
            .expect("client construction should not fail");
        assert_eq!(
            client.updates_url(42, 30).as_str(),
            "https://api.telegram.org/bot123:abc/getUpdates?offset=42&timeout=30"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let client =
            TelegramClient::new("123:abc", 30).expect("client construction should not fail");
        assert!(!format!("{client:?}").contains("123:abc"));
    }

    #[test]
    fn update_text_falls_back_to_channel_post() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 7,
            "channel_post": { "message_id": 1, "text": "hello" }
        }))
        .expect("update");
        assert_eq!(update.text(), Some("hello"));

        let bare: Update =
            serde_json::from_value(serde_json::json!({ "update_id": 8 })).expect("update");
        assert!(bare.text().is_none());
    }
}
