use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_FEED_URL: &str = "https://api.emergency.wa.gov.au/v1/rss/incidents";
const DEFAULT_EXCLUDE_PHRASES: &str = "insert filters,burn off";
const DEFAULT_SYNC_SCHEDULE: &str = "0 */5 * * * *";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; use it in tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup without touching the process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let store_url = require("LIVEMAP_STORE_URL")?;

    let env = parse_environment(&or_default("LIVEMAP_ENV", "development"));
    let bind_addr = parse_addr("LIVEMAP_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LIVEMAP_LOG_LEVEL", "info");

    let feed_url = or_default("LIVEMAP_FEED_URL", DEFAULT_FEED_URL);
    let feed_timeout_secs = parse_u64("LIVEMAP_FEED_TIMEOUT_SECS", "30")?;
    let feed_user_agent = or_default("LIVEMAP_FEED_USER_AGENT", "livemap/0.1 (incident-sync)");
    let feed_max_retries = parse_u32("LIVEMAP_FEED_MAX_RETRIES", "2")?;
    let feed_retry_backoff_base_ms = parse_u64("LIVEMAP_FEED_RETRY_BACKOFF_BASE_MS", "1000")?;
    let exclude_phrases = parse_phrases(&or_default(
        "LIVEMAP_EXCLUDE_PHRASES",
        DEFAULT_EXCLUDE_PHRASES,
    ));

    let store_path = or_default("LIVEMAP_STORE_PATH", "locations")
        .trim_matches('/')
        .to_string();
    if store_path.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "LIVEMAP_STORE_PATH".to_string(),
            reason: "path must not be empty".to_string(),
        });
    }
    let store_auth = optional("LIVEMAP_STORE_AUTH");
    let store_timeout_secs = parse_u64("LIVEMAP_STORE_TIMEOUT_SECS", "15")?;
    let store_max_concurrent_ops = parse_usize("LIVEMAP_STORE_MAX_CONCURRENT_OPS", "8")?;
    if store_max_concurrent_ops == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LIVEMAP_STORE_MAX_CONCURRENT_OPS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let sync_schedule = parse_schedule(&or_default("LIVEMAP_SYNC_SCHEDULE", DEFAULT_SYNC_SCHEDULE));

    let telegram_bot_token = optional("TELEGRAM_BOT_TOKEN");
    let pings_poll_timeout_secs = parse_u64("LIVEMAP_PINGS_POLL_TIMEOUT_SECS", "30")?;
    let pings_max_retries = parse_u32("LIVEMAP_PINGS_MAX_RETRIES", "5")?;
    let pings_max_retained = parse_usize("LIVEMAP_PINGS_MAX_RETAINED", "1000")?;
    if pings_max_retained == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LIVEMAP_PINGS_MAX_RETAINED".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        feed_url,
        feed_timeout_secs,
        feed_user_agent,
        feed_max_retries,
        feed_retry_backoff_base_ms,
        exclude_phrases,
        store_url,
        store_path,
        store_auth,
        store_timeout_secs,
        store_max_concurrent_ops,
        sync_schedule,
        telegram_bot_token,
        pings_poll_timeout_secs,
        pings_max_retries,
        pings_max_retained,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Split a comma-separated phrase list, lower-casing and dropping blanks.
fn parse_phrases(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `off`, `none`, or a blank value disable the scheduled sync.
fn parse_schedule(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("off")
        || trimmed.eq_ignore_ascii_case("none")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}
