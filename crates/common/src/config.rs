//! Process settings, resolved once at startup and handed to constructors.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:signals.db";
pub const DEFAULT_VENUE_BASE_URL: &str = "https://api.kraken.com";
pub const DEFAULT_VENUE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Whether orders are executed or only validated by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    Live,
    #[default]
    Validate,
}

impl ExecutionMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, Self::Validate)
    }
}

impl FromStr for ExecutionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "validate" | "dry-run" | "dryrun" => Ok(Self::Validate),
            _ => Err(()),
        }
    }
}

#[derive(Clone)]
pub struct VenueSettings {
    pub api_key: String,
    /// Base64 encoded, exactly as issued by the venue.
    pub api_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for VenueSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueSettings")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: i64,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Settings {
    pub webhook_token: String,
    pub listen_addr: String,
    pub database_url: String,
    pub execution_mode: ExecutionMode,
    /// `None` disables order execution.
    pub venue: Option<VenueSettings>,
    /// `None` disables notifications.
    pub telegram: Option<TelegramSettings>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let webhook_token = get("TOKEN").ok_or(ConfigError::Missing("TOKEN"))?;

        let execution_mode = match get("TRADING_MODE") {
            Some(raw) => raw.parse::<ExecutionMode>().map_err(|_| ConfigError::Invalid {
                key: "TRADING_MODE",
                value: raw,
            })?,
            None => ExecutionMode::default(),
        };

        let venue = match (get("KRAKEN_API_KEY"), get("KRAKEN_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => {
                let timeout = match get("KRAKEN_TIMEOUT_SECS") {
                    Some(raw) => raw
                        .parse::<u64>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .map(Duration::from_secs)
                        .ok_or(ConfigError::Invalid {
                            key: "KRAKEN_TIMEOUT_SECS",
                            value: raw,
                        })?,
                    None => DEFAULT_VENUE_TIMEOUT,
                };
                Some(VenueSettings {
                    api_key,
                    api_secret,
                    base_url: get("KRAKEN_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_VENUE_BASE_URL.to_string()),
                    timeout,
                })
            }
            _ => {
                warn!("KRAKEN_API_KEY or KRAKEN_API_SECRET not set. Order execution disabled.");
                None
            }
        };

        let telegram = match get("TELEGRAM_BOT_TOKEN") {
            Some(bot_token) => {
                let raw = get("TELEGRAM_CHAT_ID").ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID"))?;
                let chat_id = raw.parse::<i64>().map_err(|_| ConfigError::Invalid {
                    key: "TELEGRAM_CHAT_ID",
                    value: raw,
                })?;
                Some(TelegramSettings { bot_token, chat_id })
            }
            None => {
                warn!("TELEGRAM_BOT_TOKEN not set. Notifications disabled.");
                None
            }
        };

        Ok(Self {
            webhook_token,
            listen_addr: get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            execution_mode,
            venue,
            telegram,
        })
    }
}
