use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub feed_url: String,
    pub feed_timeout_secs: u64,
    pub feed_user_agent: String,
    pub feed_max_retries: u32,
    pub feed_retry_backoff_base_ms: u64,
    /// Lower-cased title phrases; matching entries never reach the store.
    pub exclude_phrases: Vec<String>,
    pub store_url: String,
    pub store_path: String,
    pub store_auth: Option<String>,
    pub store_timeout_secs: u64,
    pub store_max_concurrent_ops: usize,
    /// Cron expression for the scheduled sync. `None` disables scheduling.
    pub sync_schedule: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub pings_poll_timeout_secs: u64,
    pub pings_max_retries: u32,
    /// Oldest pings are dropped once the layer holds this many.
    pub pings_max_retained: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("feed_url", &self.feed_url)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("feed_max_retries", &self.feed_max_retries)
            .field(
                "feed_retry_backoff_base_ms",
                &self.feed_retry_backoff_base_ms,
            )
            .field("exclude_phrases", &self.exclude_phrases)
            .field("store_url", &self.store_url)
            .field("store_path", &self.store_path)
            .field(
                "store_auth",
                &self.store_auth.as_ref().map(|_| "[redacted]"),
            )
            .field("store_timeout_secs", &self.store_timeout_secs)
            .field("store_max_concurrent_ops", &self.store_max_concurrent_ops)
            .field("sync_schedule", &self.sync_schedule)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("pings_poll_timeout_secs", &self.pings_poll_timeout_secs)
            .field("pings_max_retries", &self.pings_max_retries)
            .field("pings_max_retained", &self.pings_max_retained)
            .finish()
    }
}
