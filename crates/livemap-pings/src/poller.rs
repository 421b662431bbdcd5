//! Cancellable long-poll loop feeding a [`PingLayer`].

use std::sync::Arc;
use std::time::Duration;

use livemap_core::AppConfig;
use tokio::sync::{watch, RwLock};

use crate::client::TelegramClient;
use crate::error::PingError;
use crate::layer::PingLayer;
use crate::parse::parse_ping;

const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const MAX_BACKOFF_MS: u64 = 60_000;

/// Owns the polling offset and pushes parsed pings into a shared layer.
pub struct PingPoller {
    client: TelegramClient,
    layer: Arc<RwLock<PingLayer>>,
    offset: i64,
    poll_timeout_secs: u64,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PingPoller {
    #[must_use]
    pub fn new(
        client: TelegramClient,
        layer: Arc<RwLock<PingLayer>>,
        poll_timeout_secs: u64,
        max_retries: u32,
    ) -> Self {
        Self {
            client,
            layer,
            offset: 0,
            poll_timeout_secs,
            max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }

    /// Builds a poller from config, or `None` when no bot token is set.
    ///
    /// # Errors
    ///
    /// Returns [`PingError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(
        config: &AppConfig,
        layer: Arc<RwLock<PingLayer>>,
    ) -> Result<Option<Self>, PingError> {
        let Some(token) = config.telegram_bot_token.as_deref() else {
            return Ok(None);
        };
        let client = TelegramClient::new(token, config.pings_poll_timeout_secs)?;
        Ok(Some(Self::new(
            client,
            layer,
            config.pings_poll_timeout_secs,
            config.pings_max_retries,
        )))
    }

    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Next `update_id` the poller will ask for.
    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Fetches one batch of updates and records any pings in it.
    ///
    /// Returns the number of pings added. The offset advances past every
    /// update in the batch, including ones without a Waze link.
    ///
    /// # Errors
    ///
    /// Any [`TelegramClient::get_updates`] failure. The offset is unchanged.
    pub async fn poll_once(&mut self) -> Result<usize, PingError> {
        let updates = self
            .client
            .get_updates(self.offset, self.poll_timeout_secs)
            .await?;

        let mut added = 0;
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            let Some(text) = update.text() else {
                continue;
            };
            if let Some(ping) = parse_ping(text) {
                tracing::info!(
                    update_id = update.update_id,
                    latitude = ping.latitude,
                    longitude = ping.longitude,
                    "ping received"
                );
                self.layer.write().await.push(ping);
                added += 1;
            } else {
                tracing::debug!(update_id = update.update_id, "message carries no Waze link");
            }
        }
        Ok(added)
    }

    /// Polls until `stop` changes or its sender is dropped.
    ///
    /// Consecutive failures back off exponentially with jitter. A success
    /// resets the failure count.
    ///
    /// # Errors
    ///
    /// Returns [`PingError::RetriesExhausted`] once `max_retries` consecutive
    /// polls have failed.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) -> Result<(), PingError> {
        let mut failures = 0u32;
        loop {
            if *stop.borrow_and_update() {
                return Ok(());
            }

            let result = tokio::select! {
                _ = stop.changed() => return Ok(()),
                result = self.poll_once() => result,
            };

            match result {
                Ok(_) => failures = 0,
                Err(err) => {
                    failures += 1;
                    if failures >= self.max_retries {
                        tracing::error!(failures, error = %err, "ping polling giving up");
                        return Err(PingError::RetriesExhausted {
                            attempts: failures,
                            last: Box::new(err),
                        });
                    }
                    let delay = backoff_delay(self.backoff_base_ms, failures);
                    tracing::warn!(
                        failures,
                        max_retries = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "ping poll failed; backing off"
                    );
                    tokio::select! {
                        _ = stop.changed() => return Ok(()),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

/// `base * 2^(failures-1)`, capped at 60 s, scaled by a factor in `[0.75, 1.25)`.
fn backoff_delay(backoff_base_ms: u64, failures: u32) -> Duration {
    let exp = failures.saturating_sub(1).min(10);
    let capped = backoff_base_ms
        .saturating_mul(1u64 << exp)
        .min(MAX_BACKOFF_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(delay_ms)
}
